pub mod booking;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;

pub use booking::{
    BookingAttempt, BookingFlow, BookingFlowError, BookingRequestBuilder, BookingSubmitter,
    CatalogProvider, Clock, CollaboratorError, DateRangeIssue, RejectionReason, SessionResolver,
    SystemClock,
};
pub use catalog::Catalog;
pub use domain::booking::{Booking, BookingId, BookingRequest, BookingStatus, SubmittedBooking};
pub use domain::user::{SessionToken, UserId};
pub use domain::vehicle::{Vehicle, VehicleId, VehicleRecord, VehicleRecordError};
pub use errors::{ApplicationError, DomainError, InterfaceError};
