use std::sync::Arc;

use tracing::debug;

use crate::db::{Store, StoreError};

use super::{
    aggregate::{DailyMaxima, DailyTemperature, PlantTotals, RangeTotals},
    DateRange,
};

/// Runs the report queries against the store for a validated [`DateRange`].
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn Store>,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Power totals (and mean temperature) of one inverter.
    /// `None` when the inverter has no readings in `range`.
    pub async fn range_totals(
        &self,
        inverter_id: i64,
        range: &DateRange,
    ) -> Result<Option<RangeTotals>, StoreError> {
        let totals = self
            .store
            .range_totals(inverter_id, range.start, range.end)
            .await?;
        debug!(
            inverter_id,
            from = %range.start_iso(),
            to = %range.end_iso(),
            readings = totals.as_ref().map_or(0, |t| t.reading_count),
            "Range totals computed"
        );
        Ok(totals)
    }

    /// Daily mean temperature of one inverter; empty when nothing matched.
    pub async fn daily_average_temperature(
        &self,
        inverter_id: i64,
        range: &DateRange,
    ) -> Result<Vec<DailyTemperature>, StoreError> {
        let days = self
            .store
            .daily_average_temperature(inverter_id, range.start, range.end)
            .await?;
        debug!(inverter_id, days = days.len(), "Daily temperatures computed");
        Ok(days)
    }

    /// Daily maximum power of one inverter.
    /// `None` when the inverter has no readings in `range`.
    pub async fn daily_max_power(
        &self,
        inverter_id: i64,
        range: &DateRange,
    ) -> Result<Option<DailyMaxima>, StoreError> {
        let maxima = self
            .store
            .daily_max_power(inverter_id, range.start, range.end)
            .await?;
        debug!(
            inverter_id,
            days = maxima.as_ref().map_or(0, |m| m.days.len()),
            "Daily maxima computed"
        );
        Ok(maxima)
    }

    /// Generation totals over every inverter of a plant.
    pub async fn plant_totals(
        &self,
        inverter_ids: &[i64],
        range: &DateRange,
    ) -> Result<PlantTotals, StoreError> {
        let totals = self
            .store
            .plant_totals(inverter_ids, range.start, range.end)
            .await?;
        debug!(
            inverters = ?inverter_ids,
            reporting = totals.per_inverter.len(),
            "Plant totals computed"
        );
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::db::{memory::MemoryStore, models::Reading};

    fn reading(inverter_id: i64, day: u32, power: f64) -> Reading {
        Reading {
            recorded_at: Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap(),
            inverter_id,
            active_power_watts: Some(power),
            temperature_celsius: Some(25.0),
        }
    }

    async fn service_with(readings: Vec<Reading>) -> ReportService {
        let store = MemoryStore::new();
        store.insert_readings(readings).await;
        ReportService::new(Arc::new(store))
    }

    #[tokio::test]
    async fn range_totals_only_sees_requested_inverter_and_range() {
        let service = service_with(vec![
            reading(1, 1, 100.0),
            reading(1, 15, 200.0),
            reading(2, 15, 999.0),
        ])
        .await;

        let range = DateRange::from_days("2025-01-10", "2025-01-20").unwrap();
        let totals = service.range_totals(1, &range).await.unwrap().unwrap();
        assert_eq!(totals.total_power, 200.0);
        assert_eq!(totals.reading_count, 1);
    }

    #[tokio::test]
    async fn range_totals_none_without_readings() {
        let service = service_with(vec![reading(1, 1, 100.0)]).await;
        let range = DateRange::from_days("2025-01-02", "2025-01-31").unwrap();
        assert!(service.range_totals(1, &range).await.unwrap().is_none());
        assert!(service.daily_max_power(1, &range).await.unwrap().is_none());
        assert!(service
            .daily_average_temperature(1, &range)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn plant_totals_sums_across_inverter_set() {
        let service = service_with(vec![
            reading(1, 3, 10.0),
            reading(4, 3, 30.0),
            reading(5, 3, 1000.0),
        ])
        .await;

        let range = DateRange::from_days("2025-01-01", "2025-01-31").unwrap();
        let totals = service.plant_totals(&[1, 2, 3, 4], &range).await.unwrap();
        assert_eq!(totals.grand_total, 40.0);
        assert_eq!(totals.per_inverter.len(), 2);
    }
}
