use serde::{Deserialize, Serialize};

use crate::analyzers::types::{AggFn, KeyField, ValueField};
use crate::error::Result;
use crate::features::RowPolicy;

/// Tunables for one analysis run.
///
/// Stored as a plain JSON object on disk; every key is optional:
/// ```json
/// {
///   "row_policy": "skip_invalid",
///   "pivot_value": "average_speed",
///   "pivot_function": "mean",
///   "statistics_columns": ["vehicle_count"],
///   "categorical_columns": ["weather_condition", "intersection_name"],
///   "empty_weekdays": true
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub row_policy: RowPolicy,
    pub pivot_value: ValueField,
    pub pivot_function: AggFn,
    pub statistics_columns: Vec<ValueField>,
    pub categorical_columns: Vec<KeyField>,
    /// List all seven days in the weekday table, zero-filled when unobserved.
    pub empty_weekdays: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            row_policy: RowPolicy::FailFast,
            pivot_value: ValueField::VehicleCount,
            pivot_function: AggFn::Sum,
            statistics_columns: vec![ValueField::VehicleCount, ValueField::AverageSpeed],
            categorical_columns: vec![
                KeyField::Weather,
                KeyField::Intersection,
                KeyField::HourCategory,
                KeyField::DayOfWeek,
            ],
            empty_weekdays: true,
        }
    }
}

impl AnalysisConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
