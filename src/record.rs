//! Traffic sensor records as ingested, validated and enriched.

use chrono::{Month, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::analyzers::types::{KeyField, KeyValue, ValueField};
use crate::error::{AnalysisError, Result};
use crate::features::HourCategory;

/// A single row as delivered by an ingestion collaborator.
///
/// Every field is optional text so that missing columns and blank cells are
/// reported as schema errors by [`TrafficRecord::from_raw`] rather than by
/// the decoder.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RawRecord {
    pub timestamp: Option<String>,
    pub intersection_name: Option<String>,
    pub vehicle_count: Option<String>,
    pub average_speed: Option<String>,
    pub weather_condition: Option<String>,
}

impl RawRecord {
    /// Builds a fully populated raw row. Mostly useful for in-memory sources.
    pub fn new(
        timestamp: &str,
        intersection_name: &str,
        vehicle_count: u64,
        average_speed: f64,
        weather_condition: &str,
    ) -> Self {
        RawRecord {
            timestamp: Some(timestamp.to_string()),
            intersection_name: Some(intersection_name.to_string()),
            vehicle_count: Some(vehicle_count.to_string()),
            average_speed: Some(average_speed.to_string()),
            weather_condition: Some(weather_condition.to_string()),
        }
    }
}

/// A validated traffic observation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrafficRecord {
    pub timestamp: NaiveDateTime,
    pub intersection_name: String,
    pub vehicle_count: u64,
    pub average_speed: f64,
    pub weather_condition: String,
}

fn required<'a>(value: &'a Option<String>, field: &str, row: usize) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AnalysisError::schema(format!(
            "row {row}: required field '{field}' is missing"
        ))),
    }
}

impl TrafficRecord {
    /// Validates a raw row. `row` is the 1-based position used in error messages.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::Schema`] when a field is absent or mistyped,
    /// [`AnalysisError::Parse`] when the timestamp is not understood.
    pub fn from_raw(raw: &RawRecord, row: usize) -> Result<Self> {
        let timestamp_text = required(&raw.timestamp, "timestamp", row)?;
        let intersection_name = required(&raw.intersection_name, "intersection_name", row)?;
        let count_text = required(&raw.vehicle_count, "vehicle_count", row)?;
        let speed_text = required(&raw.average_speed, "average_speed", row)?;
        let weather_condition = required(&raw.weather_condition, "weather_condition", row)?;

        let vehicle_count: u64 = count_text.parse().map_err(|_| {
            AnalysisError::schema(format!(
                "row {row}: vehicle_count '{count_text}' is not a non-negative integer"
            ))
        })?;

        let average_speed: f64 = match speed_text.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => v,
            _ => {
                return Err(AnalysisError::schema(format!(
                    "row {row}: average_speed '{speed_text}' is not a non-negative number"
                )));
            }
        };

        let timestamp = crate::features::parse_timestamp(timestamp_text).ok_or_else(|| {
            AnalysisError::Parse {
                row,
                value: timestamp_text.to_string(),
            }
        })?;

        Ok(TrafficRecord {
            timestamp,
            intersection_name: intersection_name.to_string(),
            vehicle_count,
            average_speed,
            weather_condition: weather_condition.to_string(),
        })
    }
}

/// A [`TrafficRecord`] with its derived time features.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRecord {
    pub record: TrafficRecord,
    pub hour: u32,
    pub day_of_week: Weekday,
    pub month: Month,
    pub hour_category: HourCategory,
}

impl EnrichedRecord {
    /// Returns the grouping value of `field` for this record.
    pub fn key(&self, field: KeyField) -> KeyValue {
        match field {
            KeyField::Hour => KeyValue::Hour(self.hour),
            KeyField::DayOfWeek => KeyValue::Day(self.day_of_week),
            KeyField::Month => KeyValue::Month(self.month),
            KeyField::HourCategory => KeyValue::Category(self.hour_category),
            KeyField::Intersection => KeyValue::Text(self.record.intersection_name.clone()),
            KeyField::Weather => KeyValue::Text(self.record.weather_condition.clone()),
        }
    }

    /// Returns the numeric value of `field` for this record.
    pub fn value(&self, field: ValueField) -> f64 {
        match field {
            ValueField::VehicleCount => self.record.vehicle_count as f64,
            ValueField::AverageSpeed => self.record.average_speed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_valid_row() {
        let raw = RawRecord::new("2024-03-04 08:15:00", "Civil Lines", 42, 31.5, "Clear");
        let rec = TrafficRecord::from_raw(&raw, 1).unwrap();

        assert_eq!(rec.intersection_name, "Civil Lines");
        assert_eq!(rec.vehicle_count, 42);
        assert_eq!(rec.average_speed, 31.5);
        assert_eq!(rec.weather_condition, "Clear");
    }

    #[test]
    fn test_from_raw_missing_field_is_schema_error() {
        let mut raw = RawRecord::new("2024-03-04 08:15:00", "Civil Lines", 42, 31.5, "Clear");
        raw.weather_condition = None;

        let err = TrafficRecord::from_raw(&raw, 7).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(ref m) if m.contains("weather_condition")));
        assert!(err.to_string().contains("row 7"));
    }

    #[test]
    fn test_from_raw_blank_field_is_missing() {
        let mut raw = RawRecord::new("2024-03-04 08:15:00", "Civil Lines", 42, 31.5, "Clear");
        raw.intersection_name = Some("   ".to_string());

        let err = TrafficRecord::from_raw(&raw, 1).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(_)));
    }

    #[test]
    fn test_from_raw_mistyped_count() {
        let mut raw = RawRecord::new("2024-03-04 08:15:00", "Civil Lines", 42, 31.5, "Clear");
        raw.vehicle_count = Some("-3".to_string());

        let err = TrafficRecord::from_raw(&raw, 1).unwrap_err();
        assert!(matches!(err, AnalysisError::Schema(ref m) if m.contains("vehicle_count")));
    }

    #[test]
    fn test_from_raw_negative_speed() {
        let mut raw = RawRecord::new("2024-03-04 08:15:00", "Civil Lines", 42, 31.5, "Clear");
        raw.average_speed = Some("-1.0".to_string());

        assert!(TrafficRecord::from_raw(&raw, 1).is_err());
    }

    #[test]
    fn test_from_raw_bad_timestamp_is_parse_error() {
        let raw = RawRecord::new("not a date", "Civil Lines", 42, 31.5, "Clear");
        let err = TrafficRecord::from_raw(&raw, 2).unwrap_err();

        assert!(matches!(err, AnalysisError::Parse { row: 2, .. }));
    }
}
