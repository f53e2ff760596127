use rental_db::{DemoFleet, VehicleSeedInfo};

use crate::commands::{load_config, open_database, runtime, CommandResult, StepFailure};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;

        let seeded = DemoFleet::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = DemoFleet::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<String, StepFailure> = if verification.all_present {
            Ok(summary(&seeded.vehicles_seeded))
        } else {
            let failed = failed_checks(&verification.checks);
            Err(("seed_verification", verification_message(&failed), 6u8))
        };

        pool.close().await;
        run_result
    });

    CommandResult::from_step("seed", result)
}

fn summary(vehicles: &[VehicleSeedInfo]) -> String {
    let lines: Vec<String> = vehicles
        .iter()
        .map(|vehicle| {
            let availability = if vehicle.available { "available" } else { "unavailable" };
            format!("  - {}: {} ({availability})", vehicle.vehicle_id, vehicle.display_name)
        })
        .collect();
    format!("demo fleet loaded ({} vehicles):\n{}", vehicles.len(), lines.join("\n"))
}

fn failed_checks(checks: &[(String, bool)]) -> Vec<&str> {
    checks.iter().filter_map(|(check, passed)| (!passed).then_some(check.as_str())).collect()
}

fn verification_message(failed: &[&str]) -> String {
    if failed.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for vehicles: {}", failed.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use rental_db::VehicleSeedInfo;

    use super::{failed_checks, summary, verification_message};

    #[test]
    fn verification_error_message_targets_failed_checks() {
        let checks = vec![
            ("veh-a".to_string(), true),
            ("veh-b".to_string(), false),
            ("veh-c".to_string(), false),
        ];

        let message = verification_message(&failed_checks(&checks));

        assert_eq!(message, "Seed verification failed for vehicles: veh-b, veh-c");
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_message(&[]), "Some seed data failed to load");
    }

    #[test]
    fn summary_lists_each_vehicle_with_availability() {
        let message = summary(&[VehicleSeedInfo {
            vehicle_id: "veh-x".to_string(),
            display_name: "Ford Mustang".to_string(),
            available: false,
        }]);

        assert_eq!(
            message,
            "demo fleet loaded (1 vehicles):\n  - veh-x: Ford Mustang (unavailable)"
        );
    }
}
