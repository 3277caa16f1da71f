//! In-memory [`Store`] used by handler and seeding tests.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    models::{Inverter, Plant, Reading},
    Store, StoreError,
};
use crate::reports::aggregate::{
    self, DailyMaxima, DailyTemperature, PlantTotals, RangeTotals,
};

#[derive(Default)]
struct Inner {
    readings: Vec<Reading>,
    plants: BTreeMap<i64, Plant>,
    inverters: BTreeMap<i64, Inverter>,
    seeded: HashMap<String, u64>,
}

/// Cheaply clonable; clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append readings directly, bypassing the seed flag.
    pub async fn insert_readings(&self, readings: impl IntoIterator<Item = Reading>) {
        self.inner.write().await.readings.extend(readings);
    }

    pub async fn reading_count(&self) -> usize {
        self.inner.read().await.readings.len()
    }

    /// Readings of any of `inverter_ids` with `from <= recorded_at <= to`,
    /// ordered by `recorded_at`.
    pub async fn readings_between(
        &self,
        inverter_ids: &[i64],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<Reading> {
        let mut rows: Vec<Reading> = self
            .inner
            .read()
            .await
            .readings
            .iter()
            .filter(|r| inverter_ids.contains(&r.inverter_id))
            .filter(|r| r.recorded_at >= from && r.recorded_at <= to)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.recorded_at);
        rows
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn range_totals(
        &self,
        inverter_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<RangeTotals>, StoreError> {
        let rows = self.readings_between(&[inverter_id], from, to).await;
        Ok(aggregate::range_totals(&rows))
    }

    async fn daily_average_temperature(
        &self,
        inverter_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DailyTemperature>, StoreError> {
        let rows = self.readings_between(&[inverter_id], from, to).await;
        Ok(aggregate::daily_average_temperature(&rows))
    }

    async fn daily_max_power(
        &self,
        inverter_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Option<DailyMaxima>, StoreError> {
        let rows = self.readings_between(&[inverter_id], from, to).await;
        Ok(aggregate::daily_max_power(&rows))
    }

    async fn plant_totals(
        &self,
        inverter_ids: &[i64],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<PlantTotals, StoreError> {
        let rows = self.readings_between(inverter_ids, from, to).await;
        Ok(aggregate::plant_totals(&rows))
    }

    async fn create_plant(&self, plant: &Plant) -> Result<Plant, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.plants.contains_key(&plant.id) {
            return Err(StoreError::Conflict(format!("plants.id = {}", plant.id)));
        }
        inner.plants.insert(plant.id, plant.clone());
        Ok(plant.clone())
    }

    async fn list_plants(&self) -> Result<Vec<Plant>, StoreError> {
        Ok(self.inner.read().await.plants.values().cloned().collect())
    }

    async fn get_plant(&self, id: i64) -> Result<Option<Plant>, StoreError> {
        Ok(self.inner.read().await.plants.get(&id).cloned())
    }

    async fn update_plant(
        &self,
        id: i64,
        name: Option<&str>,
    ) -> Result<Option<Plant>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(plant) = inner.plants.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = name {
            plant.name = name.to_owned();
        }
        Ok(Some(plant.clone()))
    }

    async fn delete_plant(&self, id: i64) -> Result<Option<Plant>, StoreError> {
        Ok(self.inner.write().await.plants.remove(&id))
    }

    async fn create_inverter(&self, inverter: &Inverter) -> Result<Inverter, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.inverters.contains_key(&inverter.inverter_id) {
            return Err(StoreError::Conflict(format!(
                "inverters.inverter_id = {}",
                inverter.inverter_id
            )));
        }
        inner.inverters.insert(inverter.inverter_id, inverter.clone());
        Ok(inverter.clone())
    }

    async fn list_inverters(&self) -> Result<Vec<Inverter>, StoreError> {
        Ok(self.inner.read().await.inverters.values().cloned().collect())
    }

    async fn get_inverter(&self, inverter_id: i64) -> Result<Option<Inverter>, StoreError> {
        Ok(self.inner.read().await.inverters.get(&inverter_id).cloned())
    }

    async fn update_inverter(
        &self,
        inverter_id: i64,
        location: Option<&str>,
    ) -> Result<Option<Inverter>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(inverter) = inner.inverters.get_mut(&inverter_id) else {
            return Ok(None);
        };
        if let Some(location) = location {
            inverter.location = location.to_owned();
        }
        Ok(Some(inverter.clone()))
    }

    async fn delete_inverter(&self, inverter_id: i64) -> Result<Option<Inverter>, StoreError> {
        Ok(self.inner.write().await.inverters.remove(&inverter_id))
    }

    async fn is_seeded(&self, dataset: &str) -> Result<bool, StoreError> {
        Ok(self.inner.read().await.seeded.contains_key(dataset))
    }

    async fn seed_readings(&self, dataset: &str, readings: &[Reading]) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.seeded.contains_key(dataset) {
            return Err(StoreError::Conflict(format!("seed_state.dataset = {dataset}")));
        }
        inner.readings.extend_from_slice(readings);
        inner.seeded.insert(dataset.to_owned(), readings.len() as u64);
        Ok(readings.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn reading(inverter_id: i64, ts: DateTime<Utc>) -> Reading {
        Reading {
            recorded_at: ts,
            inverter_id,
            active_power_watts: Some(100.0),
            temperature_celsius: Some(25.0),
        }
    }

    #[tokio::test]
    async fn readings_between_is_inclusive_on_both_bounds() {
        let store = MemoryStore::new();
        let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        store
            .insert_readings([
                reading(1, from),
                reading(1, to),
                reading(1, to + chrono::Duration::milliseconds(1)),
                reading(1, from - chrono::Duration::milliseconds(1)),
            ])
            .await;

        let rows = store.readings_between(&[1], from, to).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].recorded_at, from);
        assert_eq!(rows[1].recorded_at, to);
    }

    #[tokio::test]
    async fn readings_between_filters_by_inverter_set() {
        let store = MemoryStore::new();
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        store
            .insert_readings([reading(1, ts), reading(2, ts), reading(5, ts)])
            .await;

        let rows = store.readings_between(&[1, 2], ts, ts).await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.inverter_id != 5));
    }

    #[tokio::test]
    async fn duplicate_plant_is_a_conflict_and_keeps_original() {
        let store = MemoryStore::new();
        let plant = Plant { id: 1, name: "Usina A".into() };
        store.create_plant(&plant).await.unwrap();

        let err = store
            .create_plant(&Plant { id: 1, name: "Outra".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(store.get_plant(1).await.unwrap().unwrap().name, "Usina A");
    }

    #[tokio::test]
    async fn seeding_twice_is_rejected() {
        let store = MemoryStore::new();
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        assert_eq!(store.seed_readings("metrics", &[reading(1, ts)]).await.unwrap(), 1);
        assert!(store.is_seeded("metrics").await.unwrap());
        assert!(store.seed_readings("metrics", &[reading(1, ts)]).await.is_err());
        assert_eq!(store.reading_count().await, 1);
    }
}
