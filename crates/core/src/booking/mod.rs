pub mod builder;
pub mod clock;
pub mod flow;
pub mod ports;

pub use builder::{
    billable_days, parse_date, BookingRequestBuilder, DateRangeIssue, RejectionReason,
    MILLIS_PER_DAY,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use flow::{BookingAttempt, BookingFlow, BookingFlowError};
pub use ports::{BookingSubmitter, CatalogProvider, CollaboratorError, SessionResolver};
