use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One telemetry sample produced by an inverter.
///
/// Readings are written once by the seeding step and never modified.
/// Duplicates of `(recorded_at, inverter_id)` are allowed.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Reading {
    pub recorded_at: DateTime<Utc>,
    pub inverter_id: i64,
    /// Watts
    pub active_power_watts: Option<f64>,
    /// Degrees Celsius
    pub temperature_celsius: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Plant {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Inverter {
    pub inverter_id: i64,
    pub location: String,
}
