use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::Row;

use rental_core::domain::vehicle::{Vehicle, VehicleId, VehicleRecord};

use super::{RepositoryError, VehicleRepository};
use crate::DbPool;

const VEHICLE_COLUMNS: &str =
    "id, name, model, year, price_per_day, available, description, features_json, image_url";

pub struct SqlVehicleRepository {
    pool: DbPool,
}

impl SqlVehicleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T>(result: Result<T, sqlx::Error>) -> Result<T, RepositoryError> {
    result.map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn row_to_vehicle(row: &sqlx::sqlite::SqliteRow) -> Result<Vehicle, RepositoryError> {
    let id: String = decode(row.try_get("id"))?;
    let price_raw: String = decode(row.try_get("price_per_day"))?;
    let features_json: String = decode(row.try_get("features_json"))?;

    let price_per_day = Decimal::from_str(&price_raw).map_err(|e| {
        RepositoryError::Decode(format!("vehicle `{id}` price_per_day `{price_raw}`: {e}"))
    })?;
    let features: Vec<String> = serde_json::from_str(&features_json).map_err(|e| {
        RepositoryError::Decode(format!("vehicle `{id}` features_json: {e}"))
    })?;
    let available: i64 = decode(row.try_get("available"))?;

    let record = VehicleRecord {
        name: decode(row.try_get("name"))?,
        model: decode(row.try_get("model"))?,
        year: decode(row.try_get("year"))?,
        price_per_day,
        available: available != 0,
        description: decode(row.try_get("description"))?,
        features,
        image_url: decode(row.try_get("image_url"))?,
        id,
    };

    Vehicle::try_from(record).map_err(|e| RepositoryError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl VehicleRepository for SqlVehicleRepository {
    async fn find_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {VEHICLE_COLUMNS} FROM vehicle WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_vehicle(r)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Vehicle>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> =
            sqlx::query(&format!("SELECT {VEHICLE_COLUMNS} FROM vehicle ORDER BY name, id"))
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(row_to_vehicle).collect::<Result<Vec<_>, _>>()
    }

    async fn save(&self, vehicle: Vehicle) -> Result<(), RepositoryError> {
        let record = vehicle.into_record();
        let features_json = serde_json::to_string(&record.features)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO vehicle (id, name, model, year, price_per_day, available, description,
                                  features_json, image_url, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 model = excluded.model,
                 year = excluded.year,
                 price_per_day = excluded.price_per_day,
                 available = excluded.available,
                 description = excluded.description,
                 features_json = excluded.features_json,
                 image_url = excluded.image_url,
                 updated_at = excluded.updated_at",
        )
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.model)
        .bind(record.year)
        .bind(record.price_per_day.to_string())
        .bind(record.available)
        .bind(&record.description)
        .bind(&features_json)
        .bind(&record.image_url)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
