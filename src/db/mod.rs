#[cfg(test)]
pub mod memory;
pub mod models;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

use self::models::{Inverter, Plant, Reading};
use crate::reports::aggregate::{DailyMaxima, DailyTemperature, PlantTotals, RangeTotals};

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same unique key already exists.
    #[error("duplicate key: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage operations behind every endpoint and the seeding step.
///
/// Implementations must be safe for concurrent use; handlers share one
/// instance through `Arc<dyn Store>`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Power sum, maximum and count plus mean temperature of one inverter
    /// with `from <= recorded_at <= to`. `None` when nothing matched.
    async fn range_totals(
        &self,
        inverter_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<RangeTotals>, StoreError>;

    /// Mean non-null temperature per UTC day, rounded to 2 decimals,
    /// ascending by day.
    async fn daily_average_temperature(
        &self,
        inverter_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DailyTemperature>, StoreError>;

    /// Maximum power per UTC day plus the sum of those maxima.
    /// `None` when nothing matched.
    async fn daily_max_power(
        &self,
        inverter_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<DailyMaxima>, StoreError>;

    /// Power totals over any of `inverter_ids`, per inverter ascending by id.
    async fn plant_totals(
        &self,
        inverter_ids: &[i64],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PlantTotals, StoreError>;

    async fn create_plant(&self, plant: &Plant) -> Result<Plant, StoreError>;

    /// All plants ordered by id.
    async fn list_plants(&self) -> Result<Vec<Plant>, StoreError>;

    async fn get_plant(&self, id: i64) -> Result<Option<Plant>, StoreError>;

    /// Replace the name when `name` is `Some`; `None` leaves the record as is.
    /// Returns `None` when no plant has `id`.
    async fn update_plant(&self, id: i64, name: Option<&str>)
        -> Result<Option<Plant>, StoreError>;

    /// Remove and return the plant, `None` when absent.
    async fn delete_plant(&self, id: i64) -> Result<Option<Plant>, StoreError>;

    async fn create_inverter(&self, inverter: &Inverter) -> Result<Inverter, StoreError>;

    /// All inverters ordered by id.
    async fn list_inverters(&self) -> Result<Vec<Inverter>, StoreError>;

    async fn get_inverter(&self, inverter_id: i64) -> Result<Option<Inverter>, StoreError>;

    async fn update_inverter(
        &self,
        inverter_id: i64,
        location: Option<&str>,
    ) -> Result<Option<Inverter>, StoreError>;

    async fn delete_inverter(&self, inverter_id: i64) -> Result<Option<Inverter>, StoreError>;

    /// Whether `dataset` has already been imported.
    async fn is_seeded(&self, dataset: &str) -> Result<bool, StoreError>;

    /// Insert `readings` and mark `dataset` as imported, atomically.
    /// Returns the number of readings written.
    async fn seed_readings(&self, dataset: &str, readings: &[Reading]) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_is_object_safe() {
        fn _takes_arc(_: std::sync::Arc<dyn Store>) {}
    }

    #[test]
    fn store_error_display() {
        let err = StoreError::Conflict("plants.id = 1".into());
        assert_eq!(err.to_string(), "duplicate key: plants.id = 1");
    }
}
