use thiserror::Error;

use crate::booking::builder::{NOT_AUTHENTICATED_MESSAGE, VEHICLE_UNAVAILABLE_MESSAGE};
use crate::booking::{BookingFlowError, RejectionReason};
use crate::domain::booking::BookingStatus;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid booking transition from {from:?} to {to:?}")]
    InvalidBookingTransition { from: BookingStatus, to: BookingStatus },
    #[error("booking request rejected: {0}")]
    Rejected(RejectionReason),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("submission failure: {0}")]
    Submission(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("bad request: {message}")]
    BadRequest { message: String, correlation_id: String },
    #[error("unauthorized: {message}")]
    Unauthorized { message: String, correlation_id: String },
    #[error("not found: {message}")]
    NotFound { message: String, correlation_id: String },
    #[error("conflict: {message}")]
    Conflict { message: String, correlation_id: String },
    #[error("upstream failure: {message}")]
    Upstream { message: String, correlation_id: String },
    #[error("service unavailable: {message}")]
    ServiceUnavailable { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => {
                "The request could not be processed. Check inputs and try again."
            }
            Self::Unauthorized { .. } => NOT_AUTHENTICATED_MESSAGE,
            Self::NotFound { .. } => "The requested resource was not found.",
            Self::Conflict { .. } => VEHICLE_UNAVAILABLE_MESSAGE,
            Self::Upstream { .. } => "Failed to create booking.",
            Self::ServiceUnavailable { .. } => {
                "The service is temporarily unavailable. Please retry shortly."
            }
        }
    }

    /// Stable machine-readable kind, used as the `error` field of API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "bad_request",
            Self::Unauthorized { .. } => "not_authenticated",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "vehicle_unavailable",
            Self::Upstream { .. } => "submission_failed",
            Self::ServiceUnavailable { .. } => "service_unavailable",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::BadRequest { correlation_id, .. }
            | Self::Unauthorized { correlation_id, .. }
            | Self::NotFound { correlation_id, .. }
            | Self::Conflict { correlation_id, .. }
            | Self::Upstream { correlation_id, .. }
            | Self::ServiceUnavailable { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        let mut mapped = InterfaceError::from(self);
        match &mut mapped {
            InterfaceError::BadRequest { correlation_id: id, .. }
            | InterfaceError::Unauthorized { correlation_id: id, .. }
            | InterfaceError::NotFound { correlation_id: id, .. }
            | InterfaceError::Conflict { correlation_id: id, .. }
            | InterfaceError::Upstream { correlation_id: id, .. }
            | InterfaceError::ServiceUnavailable { correlation_id: id, .. } => *id = correlation_id,
        }
        mapped
    }
}

impl From<BookingFlowError> for ApplicationError {
    fn from(value: BookingFlowError) -> Self {
        match value {
            BookingFlowError::Rejected(reason) => Self::Domain(DomainError::Rejected(reason)),
            BookingFlowError::VehicleNotFound(id) => Self::NotFound(format!("vehicle `{id}`")),
            BookingFlowError::SubmissionFailed(message) => Self::Submission(message),
            BookingFlowError::CatalogUnavailable(message)
            | BookingFlowError::SessionUnavailable(message) => Self::Persistence(message),
        }
    }
}

impl From<ApplicationError> for InterfaceError {
    fn from(value: ApplicationError) -> Self {
        let unassigned = || "unassigned".to_owned();
        match value {
            ApplicationError::Domain(DomainError::Rejected(reason)) => match reason {
                RejectionReason::NotAuthenticated => {
                    Self::Unauthorized { message: reason.to_string(), correlation_id: unassigned() }
                }
                RejectionReason::VehicleUnavailable => {
                    Self::Conflict { message: reason.to_string(), correlation_id: unassigned() }
                }
                RejectionReason::InvalidDateRange(_) => {
                    Self::BadRequest { message: reason.to_string(), correlation_id: unassigned() }
                }
            },
            ApplicationError::Domain(DomainError::InvalidBookingTransition { .. }) => {
                Self::BadRequest {
                    message: "domain validation failed".to_owned(),
                    correlation_id: unassigned(),
                }
            }
            ApplicationError::NotFound(message) => {
                Self::NotFound { message, correlation_id: unassigned() }
            }
            ApplicationError::Submission(message) => {
                Self::Upstream { message, correlation_id: unassigned() }
            }
            ApplicationError::Persistence(message) => {
                Self::ServiceUnavailable { message, correlation_id: unassigned() }
            }
        }
    }
}
