//! Data types shared by the aggregation, pivot and statistics engines.

use chrono::{Month, Weekday};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::error::{AnalysisError, Result};
use crate::features::{HourCategory, MONTHS, WEEKDAYS, weekday_name};

/// A column of an enriched record that can be grouped on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyField {
    Hour,
    DayOfWeek,
    Month,
    HourCategory,
    #[serde(rename = "intersection_name")]
    Intersection,
    #[serde(rename = "weather_condition")]
    Weather,
}

impl KeyField {
    pub fn column_name(self) -> &'static str {
        match self {
            KeyField::Hour => "hour",
            KeyField::DayOfWeek => "day_of_week",
            KeyField::Month => "month",
            KeyField::HourCategory => "hour_category",
            KeyField::Intersection => "intersection_name",
            KeyField::Weather => "weather_condition",
        }
    }

    /// Every value the field can take, in canonical order, or `None` for
    /// free-text fields.
    pub fn domain(self) -> Option<Vec<KeyValue>> {
        match self {
            KeyField::Hour => Some((0..24).map(KeyValue::Hour).collect()),
            KeyField::DayOfWeek => Some(WEEKDAYS.iter().copied().map(KeyValue::Day).collect()),
            KeyField::Month => Some(MONTHS.iter().copied().map(KeyValue::Month).collect()),
            KeyField::HourCategory => Some(
                HourCategory::ALL
                    .iter()
                    .copied()
                    .map(KeyValue::Category)
                    .collect(),
            ),
            KeyField::Intersection | KeyField::Weather => None,
        }
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// A numeric column of an enriched record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueField {
    VehicleCount,
    AverageSpeed,
}

impl ValueField {
    pub fn column_name(self) -> &'static str {
        match self {
            ValueField::VehicleCount => "vehicle_count",
            ValueField::AverageSpeed => "average_speed",
        }
    }
}

impl fmt::Display for ValueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Aggregation applied to the values of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFn {
    Sum,
    Mean,
    Count,
}

impl fmt::Display for AggFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AggFn::Sum => "sum",
            AggFn::Mean => "mean",
            AggFn::Count => "count",
        })
    }
}

/// One component of a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Hour(u32),
    Day(Weekday),
    Month(Month),
    Category(HourCategory),
    Text(String),
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Hour(h) => write!(f, "{h}"),
            KeyValue::Day(d) => f.write_str(weekday_name(*d)),
            KeyValue::Month(m) => f.write_str(m.name()),
            KeyValue::Category(c) => f.write_str(c.label()),
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for KeyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            KeyValue::Hour(h) => serializer.serialize_u32(*h),
            other => serializer.collect_str(other),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Text(value.to_string())
    }
}

/// A grouping key: one [`KeyValue`] per grouped field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GroupKey(pub Vec<KeyValue>);

impl GroupKey {
    pub fn single(value: impl Into<KeyValue>) -> Self {
        GroupKey(vec![value.into()])
    }
}

impl From<KeyValue> for GroupKey {
    fn from(value: KeyValue) -> Self {
        GroupKey(vec![value])
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" / ")?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// An aggregate cell. `NoData` means no observations, which is not the same
/// thing as an observed zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue {
    Observed(f64),
    NoData,
}

impl CellValue {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            CellValue::Observed(v) => Some(v),
            CellValue::NoData => None,
        }
    }

    pub fn is_no_data(self) -> bool {
        matches!(self, CellValue::NoData)
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CellValue::Observed(v) => serializer.serialize_f64(*v),
            CellValue::NoData => serializer.serialize_none(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Observed(v) => write!(f, "{v}"),
            CellValue::NoData => f.write_str("-"),
        }
    }
}

/// A descriptive statistic that may be undefined for the sample size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statistic {
    Value(f64),
    Undefined,
}

impl Statistic {
    /// Returns the number, or [`AnalysisError::UndefinedStatistic`].
    pub fn value(self, statistic: &'static str, n: usize) -> Result<f64> {
        match self {
            Statistic::Value(v) => Ok(v),
            Statistic::Undefined => Err(AnalysisError::UndefinedStatistic { statistic, n }),
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Statistic::Undefined)
    }
}

impl Serialize for Statistic {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Statistic::Value(v) => serializer.serialize_f64(*v),
            Statistic::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Value(v) => write!(f, "{v:.6}"),
            Statistic::Undefined => f.write_str("undefined"),
        }
    }
}

/// One aggregate value for one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub key: GroupKey,
    pub function: AggFn,
    pub value: CellValue,
}

/// The output of one group-by: results ordered group-major, then by the
/// order the functions were requested in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedAggregate {
    pub keys: Vec<KeyField>,
    pub value: ValueField,
    pub functions: Vec<AggFn>,
    pub results: Vec<AggregateResult>,
}

impl GroupedAggregate {
    /// Distinct group keys in output order.
    pub fn groups(&self) -> Vec<&GroupKey> {
        let stride = self.functions.len().max(1);
        self.results.iter().step_by(stride).map(|r| &r.key).collect()
    }

    pub fn get(&self, key: &GroupKey, function: AggFn) -> Option<CellValue> {
        self.results
            .iter()
            .find(|r| &r.key == key && r.function == function)
            .map(|r| r.value)
    }

    /// `(key, value)` pairs for one function, in output order.
    pub fn column(&self, function: AggFn) -> Vec<(&GroupKey, CellValue)> {
        self.results
            .iter()
            .filter(|r| r.function == function)
            .map(|r| (&r.key, r.value))
            .collect()
    }

    /// Sum of the observed values of one function across all groups.
    pub fn total(&self, function: AggFn) -> f64 {
        self.column(function)
            .into_iter()
            .filter_map(|(_, v)| v.as_f64())
            .sum()
    }
}

/// Dense weekday-by-hour table of one aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotMatrix {
    pub value: ValueField,
    pub function: AggFn,
    pub rows: Vec<KeyValue>,
    pub columns: Vec<u32>,
    pub cells: Vec<Vec<CellValue>>,
}

/// Descriptive statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub mode: f64,
    pub std: Statistic,
    pub min: f64,
    pub max: f64,
    pub skew: Statistic,
    pub kurtosis: Statistic,
}

impl StatSummary {
    pub fn std_dev(&self) -> Result<f64> {
        self.std.value("std", self.count)
    }

    pub fn skewness(&self) -> Result<f64> {
        self.skew.value("skew", self.count)
    }

    pub fn excess_kurtosis(&self) -> Result<f64> {
        self.kurtosis.value("kurtosis", self.count)
    }
}

/// Count and share of one category value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
    pub percentage: f64,
}

/// Distribution of one categorical column, most frequent first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub total: usize,
    pub entries: Vec<FrequencyEntry>,
}

impl CategoricalSummary {
    pub fn get(&self, value: &str) -> Option<&FrequencyEntry> {
        self.entries.iter().find(|e| e.value == value)
    }
}

/// Share of one group in a column total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareEntry {
    pub key: String,
    pub value: f64,
    pub percentage: f64,
}

/// How a numeric column's total splits across the values of a key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueShare {
    pub key: KeyField,
    pub value: ValueField,
    pub total: f64,
    pub entries: Vec<ShareEntry>,
}
