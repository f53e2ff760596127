//! Storage-backed implementations of the booking flow's collaborator contracts.

use std::sync::Arc;

use async_trait::async_trait;

use rental_core::domain::booking::{Booking, BookingId, BookingRequest, SubmittedBooking};
use rental_core::domain::user::{SessionToken, UserId};
use rental_core::domain::vehicle::{Vehicle, VehicleId};
use rental_core::{BookingSubmitter, CatalogProvider, Clock, CollaboratorError, SessionResolver};

use crate::repositories::{hash_token, BookingRepository, SessionRepository, VehicleRepository};

pub struct CatalogAdapter<R> {
    vehicles: R,
}

impl<R> CatalogAdapter<R> {
    pub fn new(vehicles: R) -> Self {
        Self { vehicles }
    }
}

#[async_trait]
impl<R> CatalogProvider for CatalogAdapter<R>
where
    R: VehicleRepository,
{
    async fn fetch_vehicle(&self, id: &VehicleId) -> Result<Option<Vehicle>, CollaboratorError> {
        Ok(self.vehicles.find_by_id(id).await?)
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, CollaboratorError> {
        Ok(self.vehicles.list().await?)
    }
}

/// Resolves bearer tokens against stored sessions. Expired sessions resolve to no user.
pub struct SessionAdapter<R> {
    sessions: R,
    clock: Arc<dyn Clock>,
}

impl<R> SessionAdapter<R> {
    pub fn new(sessions: R, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }
}

#[async_trait]
impl<R> SessionResolver for SessionAdapter<R>
where
    R: SessionRepository,
{
    async fn current_user(
        &self,
        token: &SessionToken,
    ) -> Result<Option<UserId>, CollaboratorError> {
        let record = self.sessions.find_by_token_hash(&hash_token(token.expose())).await?;
        let now = self.clock.now();

        Ok(record.filter(|session| session.is_active_at(now)).map(|session| session.user_id))
    }
}

/// Accepts a validated request by persisting it as a pending booking.
pub struct SubmissionAdapter<R> {
    bookings: R,
    clock: Arc<dyn Clock>,
}

impl<R> SubmissionAdapter<R> {
    pub fn new(bookings: R, clock: Arc<dyn Clock>) -> Self {
        Self { bookings, clock }
    }
}

#[async_trait]
impl<R> BookingSubmitter for SubmissionAdapter<R>
where
    R: BookingRepository,
{
    async fn submit(&self, request: BookingRequest) -> Result<SubmittedBooking, CollaboratorError> {
        let booking = Booking::from_request(BookingId::generate(), request, self.clock.now());
        let submitted = SubmittedBooking { id: booking.id.clone(), status: booking.status };

        self.bookings.save(booking).await?;
        Ok(submitted)
    }
}
