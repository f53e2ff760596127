use async_trait::async_trait;
use thiserror::Error;

use crate::domain::booking::{BookingRequest, SubmittedBooking};
use crate::domain::user::{SessionToken, UserId};
use crate::domain::vehicle::{Vehicle, VehicleId};

/// Failure reported by an external collaborator. Carries a message only;
/// callers never branch on its content.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_vehicle(&self, id: &VehicleId) -> Result<Option<Vehicle>, CollaboratorError>;
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, CollaboratorError>;
}

#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn current_user(&self, token: &SessionToken)
        -> Result<Option<UserId>, CollaboratorError>;
}

#[async_trait]
pub trait BookingSubmitter: Send + Sync {
    async fn submit(&self, request: BookingRequest)
        -> Result<SubmittedBooking, CollaboratorError>;
}
