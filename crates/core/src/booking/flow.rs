use thiserror::Error;
use tracing::{info, warn};

use crate::booking::builder::{BookingRequestBuilder, RejectionReason};
use crate::booking::ports::{BookingSubmitter, CatalogProvider, SessionResolver};
use crate::domain::booking::SubmittedBooking;
use crate::domain::user::SessionToken;
use crate::domain::vehicle::VehicleId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BookingFlowError {
    #[error(transparent)]
    Rejected(#[from] RejectionReason),
    #[error("vehicle `{0}` was not found")]
    VehicleNotFound(VehicleId),
    #[error("booking submission failed: {0}")]
    SubmissionFailed(String),
    #[error("catalog lookup failed: {0}")]
    CatalogUnavailable(String),
    #[error("session lookup failed: {0}")]
    SessionUnavailable(String),
}

#[derive(Clone, Copy, Debug)]
pub struct BookingAttempt<'a> {
    pub correlation_id: &'a str,
    pub token: Option<&'a SessionToken>,
    pub vehicle_id: &'a VehicleId,
    pub start_date: &'a str,
    pub end_date: &'a str,
}

/// One booking submission: session, fresh vehicle read, validation, submit.
/// Every call is single-shot; nothing is retried.
pub struct BookingFlow<C, S, B> {
    catalog: C,
    sessions: S,
    submitter: B,
    builder: BookingRequestBuilder,
}

impl<C, S, B> BookingFlow<C, S, B>
where
    C: CatalogProvider,
    S: SessionResolver,
    B: BookingSubmitter,
{
    pub fn new(catalog: C, sessions: S, submitter: B, builder: BookingRequestBuilder) -> Self {
        Self { catalog, sessions, submitter, builder }
    }

    pub async fn submit(
        &self,
        attempt: BookingAttempt<'_>,
    ) -> Result<SubmittedBooking, BookingFlowError> {
        let correlation_id = attempt.correlation_id;
        let vehicle_id = attempt.vehicle_id;

        let user_id = match attempt.token {
            Some(token) => self
                .sessions
                .current_user(token)
                .await
                .map_err(|error| BookingFlowError::SessionUnavailable(error.0))?,
            None => None,
        };
        let Some(user_id) = user_id else {
            info!(
                event_name = "booking.flow.unauthenticated",
                correlation_id = %correlation_id,
                vehicle_id = %vehicle_id,
                "booking attempt without an authenticated session"
            );
            return Err(RejectionReason::NotAuthenticated.into());
        };

        let vehicle = self
            .catalog
            .fetch_vehicle(vehicle_id)
            .await
            .map_err(|error| BookingFlowError::CatalogUnavailable(error.0))?
            .ok_or_else(|| BookingFlowError::VehicleNotFound(vehicle_id.clone()))?;

        let request = self
            .builder
            .build(&vehicle, Some(&user_id), attempt.start_date, attempt.end_date)
            .map_err(|reason| {
                info!(
                    event_name = "booking.flow.rejected",
                    correlation_id = %correlation_id,
                    vehicle_id = %vehicle_id,
                    user_id = %user_id,
                    reason = reason.kind(),
                    "booking request rejected"
                );
                BookingFlowError::Rejected(reason)
            })?;

        let total_price = request.total_price();
        let rental_days = request.rental_days();
        let submitted = self.submitter.submit(request).await.map_err(|error| {
            warn!(
                event_name = "booking.flow.submission_failed",
                correlation_id = %correlation_id,
                vehicle_id = %vehicle_id,
                user_id = %user_id,
                error = %error,
                "booking submission failed"
            );
            BookingFlowError::SubmissionFailed(error.0)
        })?;

        info!(
            event_name = "booking.flow.submitted",
            correlation_id = %correlation_id,
            vehicle_id = %vehicle_id,
            user_id = %user_id,
            booking_id = %submitted.id,
            rental_days,
            total_price = %total_price,
            "booking submitted"
        );

        Ok(submitted)
    }
}
