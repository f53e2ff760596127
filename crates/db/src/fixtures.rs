use rental_core::domain::vehicle::{Vehicle, VehicleId, VehicleRecord};

use crate::connection::DbPool;
use crate::repositories::{RepositoryError, SqlVehicleRepository, VehicleRepository};

/// Deterministic demo fleet used by `rental seed` and end-to-end tests.
///
/// Loading is an upsert keyed on vehicle id, so repeated loads converge on the
/// same catalog instead of duplicating rows.
pub struct DemoFleet;

impl DemoFleet {
    /// JSON fixture content for the demo fleet.
    pub const JSON: &str = include_str!("../../../config/fixtures/demo_fleet.json");

    /// Parses and validates every fixture record.
    pub fn vehicles() -> Result<Vec<Vehicle>, RepositoryError> {
        let records: Vec<VehicleRecord> = serde_json::from_str(Self::JSON)
            .map_err(|e| RepositoryError::Decode(format!("demo fleet fixture: {e}")))?;

        records
            .into_iter()
            .map(|record| {
                Vehicle::try_from(record).map_err(|e| RepositoryError::Decode(e.to_string()))
            })
            .collect()
    }

    /// Load the demo fleet into the database.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let vehicles = Self::vehicles()?;
        let repo = SqlVehicleRepository::new(pool.clone());

        let mut seeded = Vec::with_capacity(vehicles.len());
        for vehicle in vehicles {
            seeded.push(VehicleSeedInfo {
                vehicle_id: vehicle.id().0.clone(),
                display_name: vehicle.display_name(),
                available: vehicle.is_available(),
            });
            repo.save(vehicle).await?;
        }

        Ok(SeedResult { vehicles_seeded: seeded })
    }

    /// Verify that every fixture vehicle exists with the fixture's price and availability.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let repo = SqlVehicleRepository::new(pool.clone());
        let mut checks = Vec::new();

        for expected in Self::vehicles()? {
            let stored = repo.find_by_id(expected.id()).await?;
            let matches = stored.is_some_and(|stored| {
                stored.price_per_day() == expected.price_per_day()
                    && stored.is_available() == expected.is_available()
            });
            checks.push((expected.id().0.clone(), matches));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove fixture vehicles and any bookings that reference them.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let ids: Vec<VehicleId> = Self::vehicles()?.iter().map(|v| v.id().clone()).collect();
        let mut tx = pool.begin().await?;

        for id in &ids {
            sqlx::query("DELETE FROM booking WHERE vehicle_id = ?")
                .bind(&id.0)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM vehicle WHERE id = ?").bind(&id.0).execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub vehicles_seeded: Vec<VehicleSeedInfo>,
}

#[derive(Debug)]
pub struct VehicleSeedInfo {
    pub vehicle_id: String,
    pub display_name: String,
    pub available: bool,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}

#[cfg(test)]
mod tests {
    use super::DemoFleet;
    use crate::repositories::{SqlVehicleRepository, VehicleRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[test]
    fn fixture_records_are_valid_vehicles() {
        let vehicles = DemoFleet::vehicles().expect("fixture parses");

        assert!(vehicles.len() >= 3, "home page needs at least three featured vehicles");
        assert!(vehicles.iter().any(|v| !v.is_available()));
    }

    #[tokio::test]
    async fn load_is_idempotent() {
        let pool = pool().await;

        let first = DemoFleet::load(&pool).await.expect("first load");
        let second = DemoFleet::load(&pool).await.expect("second load");
        let stored = SqlVehicleRepository::new(pool.clone()).list().await.expect("list");

        assert_eq!(first.vehicles_seeded.len(), second.vehicles_seeded.len());
        assert_eq!(stored.len(), first.vehicles_seeded.len());
        pool.close().await;
    }

    #[tokio::test]
    async fn verify_reports_missing_then_present_then_missing() {
        let pool = pool().await;

        assert!(!DemoFleet::verify(&pool).await.expect("verify empty").all_present);

        DemoFleet::load(&pool).await.expect("load");
        let verified = DemoFleet::verify(&pool).await.expect("verify loaded");
        assert!(verified.all_present, "checks: {:?}", verified.checks);

        DemoFleet::clean(&pool).await.expect("clean");
        assert!(!DemoFleet::verify(&pool).await.expect("verify cleaned").all_present);
        pool.close().await;
    }
}
