//! Time feature derivation.
//!
//! Turns raw rows into [`EnrichedRecord`]s carrying the hour, canonical
//! weekday, month and [`HourCategory`] of each observation. Enrichment is
//! all-or-nothing by default: one bad row aborts the batch.

mod hour_category;

pub use hour_category::{HourCategory, hour_category};

use chrono::{DateTime, Datelike, Month, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};
use crate::record::{EnrichedRecord, RawRecord, TrafficRecord};

/// Canonical Monday-first weekday order used by every day-keyed table.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub const MONTHS: [Month; 12] = [
    Month::January,
    Month::February,
    Month::March,
    Month::April,
    Month::May,
    Month::June,
    Month::July,
    Month::August,
    Month::September,
    Month::October,
    Month::November,
    Month::December,
];

/// Naive formats tried after RFC 3339, in order.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// English weekday name, independent of any locale.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parses a sensor timestamp into wall-clock time.
///
/// Offsets in RFC 3339 input are kept as the local wall clock of the sensor,
/// not converted to UTC. A bare date is read as midnight.
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// What to do with a row that fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowPolicy {
    /// Abort the whole batch on the first invalid row.
    #[default]
    FailFast,
    /// Drop invalid rows and keep going.
    SkipInvalid,
}

/// Derives the time features of one validated record.
pub fn enrich_record(record: TrafficRecord) -> EnrichedRecord {
    let ts = record.timestamp;
    let hour = ts.hour();

    EnrichedRecord {
        hour,
        day_of_week: ts.weekday(),
        month: MONTHS[ts.month0() as usize],
        hour_category: hour_category(hour),
        record,
    }
}

/// Validates and enriches a batch, preserving input order.
///
/// # Errors
///
/// With [`RowPolicy::FailFast`] the first invalid row is returned as the
/// error and nothing is emitted. With either policy, a batch that ends up
/// with no usable rows is [`AnalysisError::EmptyData`].
pub fn enrich(raws: &[RawRecord], policy: RowPolicy) -> Result<Vec<EnrichedRecord>> {
    let mut enriched = Vec::with_capacity(raws.len());
    let mut skipped = 0usize;

    for (idx, raw) in raws.iter().enumerate() {
        match TrafficRecord::from_raw(raw, idx + 1) {
            Ok(record) => enriched.push(enrich_record(record)),
            Err(e) => match policy {
                RowPolicy::FailFast => return Err(e),
                RowPolicy::SkipInvalid => {
                    warn!(row = idx + 1, error = %e, "Skipping invalid traffic row");
                    skipped += 1;
                }
            },
        }
    }

    debug!(rows = raws.len(), enriched = enriched.len(), skipped, "Enrichment finished");

    if enriched.is_empty() {
        return Err(AnalysisError::empty("no valid traffic records to enrich"));
    }

    Ok(enriched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(8, 15, 0)
            .unwrap();

        assert_eq!(parse_timestamp("2024-03-04 08:15:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-04T08:15:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-04 08:15"), Some(expected));
        assert_eq!(parse_timestamp("04-03-2024 08:15"), Some(expected));
        assert_eq!(parse_timestamp("03/04/2024 08:15"), Some(expected));
        assert_eq!(parse_timestamp(" 2024-03-04 08:15:00.250 ").map(|t| t.hour()), Some(8));
    }

    #[test]
    fn test_parse_rfc3339_keeps_wall_clock() {
        let ts = parse_timestamp("2024-03-04T23:30:00+05:30").unwrap();
        assert_eq!(ts.hour(), 23);
        assert_eq!(ts.weekday(), Weekday::Mon);
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let ts = parse_timestamp("2024-03-04").unwrap();
        assert_eq!(ts.hour(), 0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp("tomorrow at noon"), None);
        assert_eq!(parse_timestamp("2024-13-40 10:00:00"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_enrich_derives_features() {
        // 2024-03-04 was a Monday.
        let raws = vec![
            RawRecord::new("2024-03-04 08:15:00", "A", 10, 30.0, "Clear"),
            RawRecord::new("2024-03-10 19:00:00", "B", 5, 45.0, "Rain"),
        ];
        let out = enrich(&raws, RowPolicy::FailFast).unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].hour, 8);
        assert_eq!(out[0].day_of_week, Weekday::Mon);
        assert_eq!(out[0].month, Month::March);
        assert_eq!(out[0].hour_category, HourCategory::MorningRush);
        assert_eq!(out[1].day_of_week, Weekday::Sun);
        assert_eq!(out[1].hour_category, HourCategory::NightLate);
        assert_eq!(out[1].record.intersection_name, "B");
    }

    #[test]
    fn test_enrich_fail_fast_emits_nothing() {
        let raws = vec![
            RawRecord::new("2024-03-04 08:15:00", "A", 10, 30.0, "Clear"),
            RawRecord::new("garbage", "B", 5, 45.0, "Rain"),
            RawRecord::new("2024-03-04 09:15:00", "C", 1, 20.0, "Clear"),
        ];
        let err = enrich(&raws, RowPolicy::FailFast).unwrap_err();
        assert!(matches!(err, AnalysisError::Parse { row: 2, .. }));
    }

    #[test]
    fn test_enrich_skip_invalid_keeps_good_rows_in_order() {
        let mut missing = RawRecord::new("2024-03-04 08:15:00", "X", 1, 1.0, "Clear");
        missing.vehicle_count = None;
        let raws = vec![
            RawRecord::new("2024-03-04 08:15:00", "A", 10, 30.0, "Clear"),
            missing,
            RawRecord::new("2024-03-04 09:15:00", "C", 1, 20.0, "Clear"),
        ];
        let out = enrich(&raws, RowPolicy::SkipInvalid).unwrap();

        let names: Vec<_> = out.iter().map(|r| r.record.intersection_name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
    }

    #[test]
    fn test_enrich_empty_batch() {
        assert!(matches!(
            enrich(&[], RowPolicy::FailFast),
            Err(AnalysisError::EmptyData(_))
        ));

        let raws = vec![RawRecord::default()];
        assert!(matches!(
            enrich(&raws, RowPolicy::SkipInvalid),
            Err(AnalysisError::EmptyData(_))
        ));
    }

    #[test]
    fn test_weekday_names_are_canonical() {
        let names: Vec<_> = WEEKDAYS.iter().map(|d| weekday_name(*d)).collect();
        assert_eq!(
            names,
            vec!["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"]
        );
    }
}
