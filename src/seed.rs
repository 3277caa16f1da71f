//! One-time import of the static reading dataset.
//!
//! The dataset is a JSON array exported from a document store:
//!
//! ```json
//! [{ "datetime": { "$date": "2025-01-01T10:00:00Z" },
//!    "inversor_id": 1, "potencia_ativa_watt": 512.3, "temperatura_celsius": 28.1 }]
//! ```
//!
//! `datetime` may also be a plain ISO string or `{ "$date": <epoch millis> }`.
//! A row in `seed_state` keyed by the file name marks the dataset as imported.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::fs;
use tracing::{error, info, warn};

use crate::db::{models::Reading, Store};

#[derive(Debug, Deserialize)]
struct SeedRecord {
    datetime: SeedDateTime,
    inversor_id: i64,
    #[serde(default)]
    potencia_ativa_watt: Option<f64>,
    #[serde(default)]
    temperatura_celsius: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SeedDateTime {
    Extended {
        #[serde(rename = "$date")]
        date: ExtendedDate,
    },
    Iso(DateTime<Utc>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExtendedDate {
    Iso(DateTime<Utc>),
    Millis(i64),
}

impl SeedDateTime {
    fn resolve(self) -> Option<DateTime<Utc>> {
        match self {
            SeedDateTime::Iso(ts) | SeedDateTime::Extended { date: ExtendedDate::Iso(ts) } => {
                Some(ts)
            }
            SeedDateTime::Extended { date: ExtendedDate::Millis(ms) } => {
                DateTime::from_timestamp_millis(ms)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Imported(u64),
    AlreadySeeded,
    NoDataset,
}

/// Parse the dataset into readings, failing on the first malformed record.
pub fn parse_dataset(bytes: &[u8]) -> Result<Vec<Reading>> {
    let records: Vec<SeedRecord> =
        serde_json::from_slice(bytes).context("seed dataset is not a valid reading array")?;

    records
        .into_iter()
        .enumerate()
        .map(|(i, rec)| {
            let recorded_at = rec
                .datetime
                .resolve()
                .ok_or_else(|| anyhow!("record {i}: datetime out of range"))?;
            Ok(Reading {
                recorded_at,
                inverter_id: rec.inversor_id,
                active_power_watts: rec.potencia_ativa_watt,
                temperature_celsius: rec.temperatura_celsius,
            })
        })
        .collect()
}

/// Import `path` unless it was imported before or does not exist.
pub async fn seed_if_needed(store: &dyn Store, path: &Path) -> Result<SeedOutcome> {
    let dataset = dataset_key(path);

    if store.is_seeded(&dataset).await? {
        return Ok(SeedOutcome::AlreadySeeded);
    }

    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SeedOutcome::NoDataset),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let readings = parse_dataset(&bytes)?;
    info!(dataset = %dataset, readings = readings.len(), "Importing seed dataset");
    let written = store.seed_readings(&dataset, &readings).await?;
    Ok(SeedOutcome::Imported(written))
}

/// Startup wrapper around [`seed_if_needed`]: logs the outcome and never fails.
pub async fn run(store: &dyn Store, path: &Path) {
    match seed_if_needed(store, path).await {
        Ok(SeedOutcome::Imported(n)) => info!(readings = n, "Seed dataset imported"),
        Ok(SeedOutcome::AlreadySeeded) => info!("Seed dataset already imported; skipping"),
        Ok(SeedOutcome::NoDataset) => {
            warn!(path = %path.display(), "Seed dataset not found; skipping import")
        }
        Err(e) => error!(path = %path.display(), error = ?e, "Seed import failed"),
    }
}

/// The file name identifies a dataset, so moving the file does not re-import it.
fn dataset_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::TimeZone;

    use super::*;
    use crate::db::memory::MemoryStore;

    const SAMPLE: &str = r#"[
        {"datetime": {"$date": "2025-01-01T10:00:00.000Z"}, "inversor_id": 1,
         "potencia_ativa_watt": 512.5, "temperatura_celsius": 28.1},
        {"datetime": "2025-01-02T11:30:00Z", "inversor_id": 2,
         "potencia_ativa_watt": null, "temperatura_celsius": 30},
        {"datetime": {"$date": 1735725600000}, "inversor_id": 3}
    ]"#;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("solar-seed-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("metrics.json");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parse_dataset_accepts_all_datetime_shapes() {
        let readings = parse_dataset(SAMPLE.as_bytes()).unwrap();
        assert_eq!(readings.len(), 3);

        assert_eq!(
            readings[0].recorded_at,
            Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(readings[0].active_power_watts, Some(512.5));

        assert_eq!(readings[1].inverter_id, 2);
        assert_eq!(readings[1].active_power_watts, None);
        assert_eq!(readings[1].temperature_celsius, Some(30.0));

        // 1735725600000 ms = 2025-01-01T10:00:00Z
        assert_eq!(readings[2].recorded_at, readings[0].recorded_at);
        assert_eq!(readings[2].temperature_celsius, None);
    }

    #[test]
    fn parse_dataset_rejects_garbage() {
        assert!(parse_dataset(b"{\"not\": \"an array\"}").is_err());
        assert!(parse_dataset(br#"[{"datetime": "yesterday", "inversor_id": 1}]"#).is_err());
        assert!(parse_dataset(br#"[{"datetime": "2025-01-01T00:00:00Z"}]"#).is_err());
    }

    #[test]
    fn dataset_key_uses_file_name() {
        assert_eq!(dataset_key(Path::new("sample/metrics.json")), "metrics.json");
    }

    #[tokio::test]
    async fn seeds_once_then_skips() {
        let path = temp_file("once", SAMPLE);
        let store = MemoryStore::new();

        assert_eq!(
            seed_if_needed(&store, &path).await.unwrap(),
            SeedOutcome::Imported(3)
        );
        assert_eq!(
            seed_if_needed(&store, &path).await.unwrap(),
            SeedOutcome::AlreadySeeded
        );
        assert_eq!(store.reading_count().await, 3);
    }

    #[tokio::test]
    async fn missing_file_is_not_an_error() {
        let store = MemoryStore::new();
        let outcome = seed_if_needed(&store, Path::new("/nonexistent/solar/metrics.json"))
            .await
            .unwrap();
        assert_eq!(outcome, SeedOutcome::NoDataset);
    }

    #[tokio::test]
    async fn malformed_file_leaves_store_untouched() {
        let path = temp_file("broken", "[{\"datetime\": 1}]");
        let store = MemoryStore::new();

        assert!(seed_if_needed(&store, &path).await.is_err());
        assert!(!store.is_seeded("metrics.json").await.unwrap());
        assert_eq!(store.reading_count().await, 0);

        // `run` swallows the failure.
        run(&store, &path).await;
    }
}
