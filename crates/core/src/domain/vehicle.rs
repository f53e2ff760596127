use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_MODEL_YEAR: i32 = 1886;
pub const MAX_MODEL_YEAR: i32 = 2100;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VehicleId(pub String);

impl std::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rentable catalog item. Only constructed through [`Vehicle::try_from`], so
/// every value in the system has passed boundary validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Vehicle {
    id: VehicleId,
    name: String,
    model: String,
    year: i32,
    price_per_day: Decimal,
    available: bool,
    description: String,
    features: BTreeSet<String>,
    image_url: String,
}

impl Vehicle {
    pub fn id(&self) -> &VehicleId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn price_per_day(&self) -> Decimal {
        self.price_per_day
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn features(&self) -> &BTreeSet<String> {
        &self.features
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.model)
    }

    pub fn into_record(self) -> VehicleRecord {
        VehicleRecord {
            id: self.id.0,
            name: self.name,
            model: self.model,
            year: self.year,
            price_per_day: self.price_per_day,
            available: self.available,
            description: self.description,
            features: self.features.into_iter().collect(),
            image_url: self.image_url,
        }
    }
}

/// Vehicle shape as it arrives from storage or seed files, before validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub id: String,
    pub name: String,
    pub model: String,
    pub year: i32,
    pub price_per_day: Decimal,
    pub available: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub image_url: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VehicleRecordError {
    #[error("vehicle id must not be blank")]
    BlankId,
    #[error("vehicle `{id}` has a blank name")]
    BlankName { id: String },
    #[error("vehicle `{id}` has model year {year} outside 1886..=2100")]
    YearOutOfRange { id: String, year: i32 },
    #[error("vehicle `{id}` has negative price per day {price}")]
    NegativePrice { id: String, price: Decimal },
    #[error("vehicle `{id}` has a blank feature label")]
    BlankFeature { id: String },
}

impl TryFrom<VehicleRecord> for Vehicle {
    type Error = VehicleRecordError;

    fn try_from(record: VehicleRecord) -> Result<Self, Self::Error> {
        let id = record.id.trim().to_string();
        if id.is_empty() {
            return Err(VehicleRecordError::BlankId);
        }

        let name = record.name.trim().to_string();
        if name.is_empty() {
            return Err(VehicleRecordError::BlankName { id });
        }

        if !(MIN_MODEL_YEAR..=MAX_MODEL_YEAR).contains(&record.year) {
            return Err(VehicleRecordError::YearOutOfRange { id, year: record.year });
        }

        if record.price_per_day.is_sign_negative() && !record.price_per_day.is_zero() {
            return Err(VehicleRecordError::NegativePrice { id, price: record.price_per_day });
        }

        let mut features = BTreeSet::new();
        for label in record.features {
            let label = label.trim();
            if label.is_empty() {
                return Err(VehicleRecordError::BlankFeature { id });
            }
            features.insert(label.to_string());
        }

        Ok(Self {
            id: VehicleId(id),
            name,
            model: record.model.trim().to_string(),
            year: record.year,
            price_per_day: record.price_per_day,
            available: record.available,
            description: record.description,
            features,
            image_url: record.image_url,
        })
    }
}
