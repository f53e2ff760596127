use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::domain::booking::BookingRequest;
use crate::domain::user::UserId;
use crate::domain::vehicle::Vehicle;

pub const MILLIS_PER_DAY: i64 = 86_400_000;

pub const NOT_AUTHENTICATED_MESSAGE: &str = "Please log in to book a vehicle.";
pub const VEHICLE_UNAVAILABLE_MESSAGE: &str = "This vehicle is not available for booking.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum DateRangeIssue {
    Unparsable,
    EndNotAfterStart,
    StartInPast,
    TooLong { max_days: u32 },
}

impl std::fmt::Display for DateRangeIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unparsable => f.write_str("dates must be calendar dates (YYYY-MM-DD)"),
            Self::EndNotAfterStart => f.write_str("end date must be after start date"),
            Self::StartInPast => f.write_str("start date must not be in the past"),
            Self::TooLong { max_days } => write!(f, "bookings are limited to {max_days} days"),
        }
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    #[error("no authenticated user")]
    NotAuthenticated,
    #[error("invalid date range: {0}")]
    InvalidDateRange(DateRangeIssue),
    #[error("vehicle is not available")]
    VehicleUnavailable,
}

impl RejectionReason {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotAuthenticated => "not_authenticated",
            Self::InvalidDateRange(_) => "invalid_date_range",
            Self::VehicleUnavailable => "vehicle_unavailable",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::NotAuthenticated => NOT_AUTHENTICATED_MESSAGE.to_string(),
            Self::InvalidDateRange(issue) => {
                let mut message = issue.to_string();
                if let Some(first) = message.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                message
            }
            Self::VehicleUnavailable => VEHICLE_UNAVAILABLE_MESSAGE.to_string(),
        }
    }
}

/// Turns a vehicle, a user and two user-entered dates into a pending
/// [`BookingRequest`].
///
/// Checks run in a fixed order: authentication, vehicle availability, then
/// the date range. The first failing check decides the rejection.
#[derive(Clone, Copy, Debug)]
pub struct BookingRequestBuilder {
    today: NaiveDate,
    max_rental_days: Option<u32>,
}

impl BookingRequestBuilder {
    pub fn new(today: NaiveDate) -> Self {
        Self { today, max_rental_days: None }
    }

    pub fn with_max_rental_days(mut self, max_rental_days: u32) -> Self {
        self.max_rental_days = Some(max_rental_days);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn build(
        &self,
        vehicle: &Vehicle,
        user_id: Option<&UserId>,
        start: &str,
        end: &str,
    ) -> Result<BookingRequest, RejectionReason> {
        let user_id = match user_id {
            Some(user_id) if !user_id.is_blank() => user_id,
            _ => return Err(RejectionReason::NotAuthenticated),
        };

        if !vehicle.is_available() {
            return Err(RejectionReason::VehicleUnavailable);
        }

        let invalid = RejectionReason::InvalidDateRange;
        let (Some(start_date), Some(end_date)) = (parse_date(start), parse_date(end)) else {
            return Err(invalid(DateRangeIssue::Unparsable));
        };

        if end_date <= start_date {
            return Err(invalid(DateRangeIssue::EndNotAfterStart));
        }

        if start_date < self.today {
            return Err(invalid(DateRangeIssue::StartInPast));
        }

        let elapsed_ms = (end_date - start_date).num_milliseconds();
        let days = billable_days(elapsed_ms);
        let too_long = |max_days| invalid(DateRangeIssue::TooLong { max_days });
        let rental_days = u32::try_from(days).map_err(|_| too_long(u32::MAX))?;
        if let Some(max_days) = self.max_rental_days {
            if rental_days > max_days {
                return Err(too_long(max_days));
            }
        }

        // Overflow is only reachable with absurd prices; report the largest length that fits.
        let total_price = vehicle
            .price_per_day()
            .checked_mul(Decimal::from(rental_days))
            .ok_or_else(|| too_long(rental_days - 1))?;

        Ok(BookingRequest::pending(
            user_id.clone(),
            vehicle.id().clone(),
            start_date,
            end_date,
            rental_days,
            total_price,
        ))
    }
}

/// Elapsed milliseconds to whole days; any partial day counts as a full one.
pub fn billable_days(elapsed_ms: i64) -> i64 {
    if elapsed_ms <= 0 {
        return 0;
    }
    (elapsed_ms + MILLIS_PER_DAY - 1) / MILLIS_PER_DAY
}

/// Parses an ISO calendar date (`YYYY-MM-DD`). Times of day and offsets are
/// not accepted.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}
