use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::{
    models::{Inverter, Plant, Reading},
    Store, StoreError,
};
use crate::reports::aggregate::{
    DailyMaxPower, DailyMaxima, DailyTemperature, InverterTotal, PlantTotals, RangeTotals,
};

/// Postgres limits a statement to 65535 bind parameters; each reading binds 4.
const SEED_BATCH_SIZE: usize = 5_000;

/// [`Store`] backed by the Postgres pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Single-row result of the range totals query; `COUNT(*)` decodes as `i64`.
#[derive(FromRow)]
struct TotalsRow {
    total_power: f64,
    max_power: Option<f64>,
    reading_count: i64,
    avg_temperature: Option<f64>,
}

impl TotalsRow {
    fn into_totals(self) -> Option<RangeTotals> {
        (self.reading_count > 0).then(|| RangeTotals {
            total_power: self.total_power,
            max_power: self.max_power,
            reading_count: self.reading_count as u64,
            avg_temperature: self.avg_temperature,
        })
    }
}

/// Map a unique-constraint violation to [`StoreError::Conflict`].
fn map_unique(err: sqlx::Error, key: String) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(key),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn range_totals(
        &self,
        inverter_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<RangeTotals>, StoreError> {
        let row = sqlx::query_as::<_, TotalsRow>(
            r#"
            SELECT COALESCE(SUM(active_power_watts), 0)::float8 AS total_power,
                   MAX(active_power_watts)                      AS max_power,
                   COUNT(*)                                     AS reading_count,
                   AVG(temperature_celsius)                     AS avg_temperature
            FROM readings
            WHERE inverter_id = $1
              AND recorded_at BETWEEN $2 AND $3
            "#,
        )
        .bind(inverter_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        debug!(inverter_id, rows = row.reading_count, "Range totals queried");
        Ok(row.into_totals())
    }

    async fn daily_average_temperature(
        &self,
        inverter_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DailyTemperature>, StoreError> {
        let rows = sqlx::query_as::<_, DailyTemperature>(
            r#"
            SELECT (recorded_at AT TIME ZONE 'UTC')::date                AS day,
                   ROUND(AVG(temperature_celsius)::numeric, 2)::float8 AS avg_temperature
            FROM readings
            WHERE inverter_id = $1
              AND recorded_at BETWEEN $2 AND $3
              AND temperature_celsius IS NOT NULL
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(inverter_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn daily_max_power(
        &self,
        inverter_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<DailyMaxima>, StoreError> {
        let days = sqlx::query_as::<_, DailyMaxPower>(
            r#"
            SELECT (recorded_at AT TIME ZONE 'UTC')::date AS day,
                   MAX(active_power_watts)                AS max_power
            FROM readings
            WHERE inverter_id = $1
              AND recorded_at BETWEEN $2 AND $3
            GROUP BY 1
            ORDER BY 1
            "#,
        )
        .bind(inverter_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(DailyMaxima::from_days(days))
    }

    async fn plant_totals(
        &self,
        inverter_ids: &[i64],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PlantTotals, StoreError> {
        let per_inverter = sqlx::query_as::<_, InverterTotal>(
            r#"
            SELECT inverter_id,
                   COALESCE(SUM(active_power_watts), 0)::float8 AS total_power
            FROM readings
            WHERE inverter_id = ANY($1)
              AND recorded_at BETWEEN $2 AND $3
            GROUP BY inverter_id
            ORDER BY inverter_id
            "#,
        )
        .bind(inverter_ids)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        debug!(inverters = ?inverter_ids, reporting = per_inverter.len(), "Plant totals queried");
        Ok(PlantTotals::from_subtotals(per_inverter))
    }

    async fn create_plant(&self, plant: &Plant) -> Result<Plant, StoreError> {
        sqlx::query_as::<_, Plant>(
            "INSERT INTO plants (id, name) VALUES ($1, $2) RETURNING id, name",
        )
        .bind(plant.id)
        .bind(&plant.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, format!("plants.id = {}", plant.id)))
    }

    async fn list_plants(&self) -> Result<Vec<Plant>, StoreError> {
        let rows = sqlx::query_as::<_, Plant>("SELECT id, name FROM plants ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_plant(&self, id: i64) -> Result<Option<Plant>, StoreError> {
        let row = sqlx::query_as::<_, Plant>("SELECT id, name FROM plants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_plant(
        &self,
        id: i64,
        name: Option<&str>,
    ) -> Result<Option<Plant>, StoreError> {
        let row = sqlx::query_as::<_, Plant>(
            r#"
            UPDATE plants
            SET name = COALESCE($2, name)
            WHERE id = $1
            RETURNING id, name
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_plant(&self, id: i64) -> Result<Option<Plant>, StoreError> {
        let row = sqlx::query_as::<_, Plant>("DELETE FROM plants WHERE id = $1 RETURNING id, name")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_inverter(&self, inverter: &Inverter) -> Result<Inverter, StoreError> {
        sqlx::query_as::<_, Inverter>(
            r#"
            INSERT INTO inverters (inverter_id, location)
            VALUES ($1, $2)
            RETURNING inverter_id, location
            "#,
        )
        .bind(inverter.inverter_id)
        .bind(&inverter.location)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique(e, format!("inverters.inverter_id = {}", inverter.inverter_id)))
    }

    async fn list_inverters(&self) -> Result<Vec<Inverter>, StoreError> {
        let rows = sqlx::query_as::<_, Inverter>(
            "SELECT inverter_id, location FROM inverters ORDER BY inverter_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get_inverter(&self, inverter_id: i64) -> Result<Option<Inverter>, StoreError> {
        let row = sqlx::query_as::<_, Inverter>(
            "SELECT inverter_id, location FROM inverters WHERE inverter_id = $1",
        )
        .bind(inverter_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_inverter(
        &self,
        inverter_id: i64,
        location: Option<&str>,
    ) -> Result<Option<Inverter>, StoreError> {
        let row = sqlx::query_as::<_, Inverter>(
            r#"
            UPDATE inverters
            SET location = COALESCE($2, location)
            WHERE inverter_id = $1
            RETURNING inverter_id, location
            "#,
        )
        .bind(inverter_id)
        .bind(location)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete_inverter(&self, inverter_id: i64) -> Result<Option<Inverter>, StoreError> {
        let row = sqlx::query_as::<_, Inverter>(
            "DELETE FROM inverters WHERE inverter_id = $1 RETURNING inverter_id, location",
        )
        .bind(inverter_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn is_seeded(&self, dataset: &str) -> Result<bool, StoreError> {
        let seeded: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM seed_state WHERE dataset = $1)")
                .bind(dataset)
                .fetch_one(&self.pool)
                .await?;
        Ok(seeded)
    }

    async fn seed_readings(&self, dataset: &str, readings: &[Reading]) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for chunk in readings.chunks(SEED_BATCH_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO readings \
                 (recorded_at, inverter_id, active_power_watts, temperature_celsius) ",
            );
            builder.push_values(chunk, |mut row, r| {
                row.push_bind(r.recorded_at)
                    .push_bind(r.inverter_id)
                    .push_bind(r.active_power_watts)
                    .push_bind(r.temperature_celsius);
            });
            written += builder.build().execute(&mut *tx).await?.rows_affected();
            debug!(dataset = %dataset, written, "Seed batch inserted");
        }

        sqlx::query("INSERT INTO seed_state (dataset, readings) VALUES ($1, $2)")
            .bind(dataset)
            .bind(written as i64)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_unique(e, format!("seed_state.dataset = {dataset}")))?;

        tx.commit().await?;
        Ok(written)
    }
}
