pub mod collaborators;
pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use collaborators::{CatalogAdapter, SessionAdapter, SubmissionAdapter};
pub use connection::{connect, connect_with_config, connect_with_settings, DbPool};
pub use fixtures::{DemoFleet, SeedResult, VehicleSeedInfo, VerificationResult};
