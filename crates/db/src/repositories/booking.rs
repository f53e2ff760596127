use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use rental_core::domain::booking::{Booking, BookingId, BookingStatus};
use rental_core::domain::user::UserId;
use rental_core::domain::vehicle::VehicleId;

use super::{BookingRepository, RepositoryError};
use crate::DbPool;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqlBookingRepository {
    pool: DbPool,
}

impl SqlBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, RepositoryError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|e| RepositoryError::Decode(format!("{field} `{raw}`: {e}")))
}

fn row_to_booking(row: &sqlx::sqlite::SqliteRow) -> Result<Booking, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let user_id: String =
        row.try_get("user_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let vehicle_id: String =
        row.try_get("vehicle_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let start_date: String =
        row.try_get("start_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let end_date: String =
        row.try_get("end_date").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let rental_days: i64 =
        row.try_get("rental_days").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let total_price: String =
        row.try_get("total_price").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let status: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let status = BookingStatus::parse(&status)
        .ok_or_else(|| RepositoryError::Decode(format!("booking `{id}` status `{status}`")))?;
    let total_price = Decimal::from_str(&total_price)
        .map_err(|e| RepositoryError::Decode(format!("booking `{id}` total_price: {e}")))?;
    let rental_days = u32::try_from(rental_days)
        .map_err(|e| RepositoryError::Decode(format!("booking `{id}` rental_days: {e}")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("booking `{id}` created_at: {e}")))?;

    Ok(Booking {
        start_date: parse_date("start_date", &start_date)?,
        end_date: parse_date("end_date", &end_date)?,
        id: BookingId(id),
        user_id: UserId(user_id),
        vehicle_id: VehicleId(vehicle_id),
        rental_days,
        total_price,
        status,
        created_at,
    })
}

#[async_trait::async_trait]
impl BookingRepository for SqlBookingRepository {
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, vehicle_id, start_date, end_date, rental_days, total_price,
                    status, created_at
             FROM booking WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Booking>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT id, user_id, vehicle_id, start_date, end_date, rental_days, total_price,
                    status, created_at
             FROM booking WHERE user_id = ? ORDER BY created_at DESC, id",
        )
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_booking).collect::<Result<Vec<_>, _>>()
    }

    async fn save(&self, booking: Booking) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO booking (id, user_id, vehicle_id, start_date, end_date, rental_days,
                                  total_price, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 status = excluded.status",
        )
        .bind(&booking.id.0)
        .bind(&booking.user_id.0)
        .bind(&booking.vehicle_id.0)
        .bind(booking.start_date.format(DATE_FORMAT).to_string())
        .bind(booking.end_date.format(DATE_FORMAT).to_string())
        .bind(i64::from(booking.rental_days))
        .bind(booking.total_price.to_string())
        .bind(booking.status.as_str())
        .bind(booking.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    use rental_core::domain::booking::{Booking, BookingId, BookingStatus};
    use rental_core::domain::user::UserId;
    use rental_core::domain::vehicle::{Vehicle, VehicleId, VehicleRecord};

    use super::SqlBookingRepository;
    use crate::repositories::{BookingRepository, SqlVehicleRepository, VehicleRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn pool_with_vehicle() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let vehicle = Vehicle::try_from(VehicleRecord {
            id: "veh-1".to_string(),
            name: "Kia".to_string(),
            model: "Niro".to_string(),
            year: 2023,
            price_per_day: Decimal::new(70, 0),
            available: true,
            description: String::new(),
            features: Vec::new(),
            image_url: String::new(),
        })
        .expect("valid vehicle");
        SqlVehicleRepository::new(pool.clone()).save(vehicle).await.expect("save vehicle");
        pool
    }

    fn booking(id: &str, user: &str, minutes_after_epoch: i64) -> Booking {
        let date = |day| NaiveDate::from_ymd_opt(2030, 3, day).expect("valid date");
        let created_at = Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).single().expect("valid time")
            + Duration::minutes(minutes_after_epoch);
        Booking {
            id: BookingId(id.to_string()),
            user_id: UserId(user.to_string()),
            vehicle_id: VehicleId("veh-1".to_string()),
            start_date: date(10),
            end_date: date(13),
            rental_days: 3,
            total_price: Decimal::new(21000, 2),
            status: BookingStatus::Pending,
            created_at,
        }
    }

    #[tokio::test]
    async fn booking_round_trips_through_sqlite() {
        let pool = pool_with_vehicle().await;
        let repo = SqlBookingRepository::new(pool.clone());
        let saved = booking("B-1", "user-1", 0);

        repo.save(saved.clone()).await.expect("save");
        let found = repo.find_by_id(&saved.id).await.expect("find");

        assert_eq!(found, Some(saved));
        pool.close().await;
    }

    #[tokio::test]
    async fn list_for_user_is_newest_first_and_scoped() {
        let pool = pool_with_vehicle().await;
        let repo = SqlBookingRepository::new(pool.clone());

        repo.save(booking("B-old", "user-1", 0)).await.expect("save old");
        repo.save(booking("B-new", "user-1", 30)).await.expect("save new");
        repo.save(booking("B-other", "user-2", 15)).await.expect("save other");

        let ids: Vec<String> = repo
            .list_for_user(&UserId("user-1".to_string()))
            .await
            .expect("list")
            .into_iter()
            .map(|b| b.id.0)
            .collect();

        assert_eq!(ids, vec!["B-new", "B-old"]);
        pool.close().await;
    }

    #[tokio::test]
    async fn save_persists_status_transitions() {
        let pool = pool_with_vehicle().await;
        let repo = SqlBookingRepository::new(pool.clone());
        let mut saved = booking("B-1", "user-1", 0);
        repo.save(saved.clone()).await.expect("save");

        saved.transition_to(BookingStatus::Confirmed).expect("confirm");
        repo.save(saved.clone()).await.expect("update");

        let found = repo.find_by_id(&saved.id).await.expect("find").expect("booking exists");
        assert_eq!(found.status, BookingStatus::Confirmed);
        pool.close().await;
    }

    #[tokio::test]
    async fn booking_for_unknown_vehicle_is_rejected_by_storage() {
        let pool = pool_with_vehicle().await;
        let repo = SqlBookingRepository::new(pool.clone());
        let mut orphan = booking("B-1", "user-1", 0);
        orphan.vehicle_id = VehicleId("ghost".to_string());

        assert!(repo.save(orphan).await.is_err());
        pool.close().await;
    }

    #[tokio::test]
    async fn storage_requires_end_date_after_start_date() {
        let pool = pool_with_vehicle().await;
        let repo = SqlBookingRepository::new(pool.clone());
        let mut same_day = booking("B-1", "user-1", 0);
        same_day.end_date = same_day.start_date;

        assert!(repo.save(same_day).await.is_err());
        pool.close().await;
    }
}
