//! Reductions over a pre-filtered set of readings.
//!
//! Every function here assumes the caller already restricted the readings to
//! the requested inverters and date range. Null power or temperature values
//! are skipped by sums, maxima and averages: a sum over nothing is `0.0`, a
//! maximum or average over nothing is `None`.
//!
//! Per-day results are grouped on the UTC calendar day of `recorded_at` in a
//! `BTreeMap`, so they come out in ascending day order.
//!
//! The Postgres store computes the same results in SQL; these functions back
//! the in-memory store and define the expected semantics.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use sqlx::FromRow;

use crate::db::models::Reading;

/// Totals over a whole range, without grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeTotals {
    pub total_power: f64,
    pub max_power: Option<f64>,
    /// Every matching reading, including those with null values.
    pub reading_count: u64,
    /// Unrounded mean of the non-null temperatures.
    pub avg_temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DailyTemperature {
    pub day: NaiveDate,
    /// Rounded to 2 decimal places.
    pub avg_temperature: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DailyMaxPower {
    pub day: NaiveDate,
    pub max_power: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyMaxima {
    pub days: Vec<DailyMaxPower>,
    /// Sum of the per-day maxima.
    pub sum_of_maxima: f64,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct InverterTotal {
    pub inverter_id: i64,
    pub total_power: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlantTotals {
    pub grand_total: f64,
    /// Ascending by inverter id; only inverters with at least one reading.
    pub per_inverter: Vec<InverterTotal>,
}

impl DailyMaxima {
    /// Sum the per-day maxima, skipping days without power.
    /// `None` when `days` is empty.
    pub fn from_days(days: Vec<DailyMaxPower>) -> Option<Self> {
        if days.is_empty() {
            return None;
        }
        let sum_of_maxima = days.iter().filter_map(|d| d.max_power).sum();
        Some(Self { days, sum_of_maxima })
    }
}

impl PlantTotals {
    /// `per_inverter` must already be ascending by inverter id.
    pub fn from_subtotals(per_inverter: Vec<InverterTotal>) -> Self {
        Self {
            grand_total: per_inverter.iter().map(|t| t.total_power).sum(),
            per_inverter,
        }
    }
}

/// Running sum/max/mean accumulator for optional values.
#[derive(Debug, Default, Clone, Copy)]
struct Acc {
    sum: f64,
    max: Option<f64>,
    present: u64,
}

impl Acc {
    fn push(&mut self, value: Option<f64>) {
        let Some(v) = value else { return };
        self.sum += v;
        self.present += 1;
        self.max = Some(match self.max {
            Some(m) if m >= v => m,
            _ => v,
        });
    }

    fn mean(&self) -> Option<f64> {
        (self.present > 0).then(|| self.sum / self.present as f64)
    }
}

/// Sum, maximum and count of power plus the mean temperature, in one pass.
/// `None` when `readings` is empty.
pub fn range_totals(readings: &[Reading]) -> Option<RangeTotals> {
    if readings.is_empty() {
        return None;
    }

    let mut power = Acc::default();
    let mut temperature = Acc::default();
    for r in readings {
        power.push(r.active_power_watts);
        temperature.push(r.temperature_celsius);
    }

    Some(RangeTotals {
        total_power: power.sum,
        max_power: power.max,
        reading_count: readings.len() as u64,
        avg_temperature: temperature.mean(),
    })
}

/// Mean temperature per day, rounded to 2 decimals, ascending by day.
/// Readings without a temperature are ignored; days left with none are
/// absent from the output.
pub fn daily_average_temperature(readings: &[Reading]) -> Vec<DailyTemperature> {
    let mut by_day: BTreeMap<NaiveDate, Acc> = BTreeMap::new();
    for r in readings.iter().filter(|r| r.temperature_celsius.is_some()) {
        by_day
            .entry(r.recorded_at.date_naive())
            .or_default()
            .push(r.temperature_celsius);
    }

    by_day
        .into_iter()
        .filter_map(|(day, acc)| {
            acc.mean().map(|mean| DailyTemperature {
                day,
                avg_temperature: round2(mean),
            })
        })
        .collect()
}

/// Maximum power per day plus the sum of those maxima.
/// `None` when `readings` is empty.
pub fn daily_max_power(readings: &[Reading]) -> Option<DailyMaxima> {
    if readings.is_empty() {
        return None;
    }

    let mut by_day: BTreeMap<NaiveDate, Acc> = BTreeMap::new();
    for r in readings {
        by_day
            .entry(r.recorded_at.date_naive())
            .or_default()
            .push(r.active_power_watts);
    }

    DailyMaxima::from_days(
        by_day
            .into_iter()
            .map(|(day, acc)| DailyMaxPower { day, max_power: acc.max })
            .collect(),
    )
}

/// Grand total of power plus per-inverter subtotals. Never "not found":
/// with no readings the total is `0.0` and the list is empty.
pub fn plant_totals(readings: &[Reading]) -> PlantTotals {
    let mut by_inverter: BTreeMap<i64, Acc> = BTreeMap::new();
    for r in readings {
        by_inverter
            .entry(r.inverter_id)
            .or_default()
            .push(r.active_power_watts);
    }

    PlantTotals::from_subtotals(
        by_inverter
            .into_iter()
            .map(|(inverter_id, acc)| InverterTotal {
                inverter_id,
                total_power: acc.sum,
            })
            .collect(),
    )
}

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `YYYY-MM-DD` key used in responses.
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}
