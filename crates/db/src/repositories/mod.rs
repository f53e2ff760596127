use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use rental_core::domain::booking::{Booking, BookingId};
use rental_core::domain::user::UserId;
use rental_core::domain::vehicle::{Vehicle, VehicleId};
use rental_core::CollaboratorError;

pub mod booking;
pub mod memory;
pub mod session;
pub mod vehicle;

pub use booking::SqlBookingRepository;
pub use memory::{InMemoryBookingRepository, InMemorySessionRepository, InMemoryVehicleRepository};
pub use session::{hash_token, issue_session, IssuedSession, SessionRecord, SqlSessionRepository};
pub use vehicle::SqlVehicleRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for CollaboratorError {
    fn from(error: RepositoryError) -> Self {
        CollaboratorError(error.to_string())
    }
}

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn find_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Vehicle>, RepositoryError>;
    async fn save(&self, vehicle: Vehicle) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError>;
    /// Newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Booking>, RepositoryError>;
    async fn save(&self, booking: Booking) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn save(&self, session: SessionRecord) -> Result<(), RepositoryError>;
    async fn find_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionRecord>, RepositoryError>;
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
}
