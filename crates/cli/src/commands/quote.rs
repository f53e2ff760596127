use rental_core::domain::booking::BookingRequest;
use rental_core::domain::user::UserId;
use rental_core::domain::vehicle::{Vehicle, VehicleId};
use rental_core::{BookingRequestBuilder, Clock, RejectionReason, SystemClock};
use rental_db::repositories::{SqlVehicleRepository, VehicleRepository};

use crate::commands::{load_config, open_database, runtime, CommandResult, StepFailure};

pub struct QuoteArgs<'a> {
    pub vehicle: &'a str,
    pub user: &'a str,
    pub start: &'a str,
    pub end: &'a str,
}

/// Prices a prospective booking against the stored catalog. Nothing is submitted.
pub fn run(args: QuoteArgs<'_>) -> CommandResult {
    let Some(user_id) = UserId::parse(args.user) else {
        return rejection(RejectionReason::NotAuthenticated);
    };
    let config = match load_config("quote") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("quote") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let builder = BookingRequestBuilder::new(SystemClock.today())
        .with_max_rental_days(config.booking.max_rental_days);
    let vehicle_id = VehicleId(args.vehicle.trim().to_string());

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let vehicle = SqlVehicleRepository::new(pool.clone())
            .find_by_id(&vehicle_id)
            .await
            .map_err(|error| ("catalog_lookup", error.to_string(), 4u8));
        pool.close().await;

        let vehicle = vehicle?.ok_or_else(|| {
            ("vehicle_not_found", format!("vehicle `{vehicle_id}` not found"), 6u8)
        })?;
        Ok::<Vehicle, StepFailure>(vehicle)
    });

    let vehicle = match result {
        Ok(vehicle) => vehicle,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("quote", error_class, message, exit_code);
        }
    };

    match builder.build(&vehicle, Some(&user_id), args.start, args.end) {
        Ok(request) => CommandResult::success("quote", describe(&vehicle, &request)),
        Err(reason) => rejection(reason),
    }
}

fn rejection(reason: RejectionReason) -> CommandResult {
    CommandResult::failure("quote", reason.kind(), reason.user_message(), 6)
}

fn describe(vehicle: &Vehicle, request: &BookingRequest) -> String {
    format!(
        "{} ({}): {} day(s) x {} = {} from {} to {}",
        vehicle.display_name(),
        vehicle.id(),
        request.rental_days(),
        vehicle.price_per_day(),
        request.total_price(),
        request.start_date(),
        request.end_date(),
    )
}
