use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("Formato de data inválido. Use YYYY-MM-DD.")]
    InvalidDate,

    #[error("Data de início não pode ser posterior à data final!")]
    StartAfterEnd,
}

/// Inclusive UTC instant range covering whole calendar days:
/// `start_day 00:00:00.000` through `end_day 23:59:59.999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Build a range from two `YYYY-MM-DD` strings.
    pub fn from_days(start_day: &str, end_day: &str) -> Result<Self, RangeError> {
        let start = parse_day(start_day)?;
        let end = parse_day(end_day)?;

        let start = start.and_time(NaiveTime::MIN).and_utc();
        let end_of_day =
            NaiveTime::from_hms_milli_opt(23, 59, 59, 999).ok_or(RangeError::InvalidDate)?;
        let end = end.and_time(end_of_day).and_utc();

        if end < start {
            return Err(RangeError::StartAfterEnd);
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts <= self.end
    }

    /// `start` as ISO-8601 with milliseconds, e.g. `2025-01-01T00:00:00.000Z`.
    pub fn start_iso(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// `end` as ISO-8601 with milliseconds, e.g. `2025-01-31T23:59:59.999Z`.
    pub fn end_iso(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

fn parse_day(raw: &str) -> Result<NaiveDate, RangeError> {
    let raw = raw.trim();
    // `%Y` would also accept signed or 5+ digit years.
    if raw.len() != 10 {
        return Err(RangeError::InvalidDate);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| RangeError::InvalidDate)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn expands_to_whole_days() {
        let range = DateRange::from_days("2025-01-01", "2025-01-31").unwrap();
        assert_eq!(range.start, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(
            range.end,
            Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );
        assert_eq!(range.start_iso(), "2025-01-01T00:00:00.000Z");
        assert_eq!(range.end_iso(), "2025-01-31T23:59:59.999Z");
    }

    #[test]
    fn single_day_range_is_valid() {
        let range = DateRange::from_days("2025-03-10", "2025-03-10").unwrap();
        assert!(range.contains(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()));
        assert!(range.contains(range.end));
        assert!(!range.contains(range.end + Duration::milliseconds(1)));
        assert!(!range.contains(range.start - Duration::milliseconds(1)));
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert_eq!(
            DateRange::from_days("2025-02-01", "2025-01-31"),
            Err(RangeError::StartAfterEnd)
        );
    }

    #[test]
    fn malformed_dates_are_rejected() {
        for bad in ["2025-13-01", "2025-02-30", "01-01-2025", "2025/01/01", "abc", "", "2025-1-1"] {
            assert_eq!(
                DateRange::from_days(bad, "2025-12-31"),
                Err(RangeError::InvalidDate),
                "{bad:?} should be invalid"
            );
        }
        assert_eq!(
            DateRange::from_days("2025-01-01", "nope"),
            Err(RangeError::InvalidDate)
        );
    }

    #[test]
    fn leap_day_is_accepted() {
        assert!(DateRange::from_days("2024-02-29", "2024-02-29").is_ok());
    }
}
