//! Descriptive statistics for one numeric column.
//!
//! Skewness is the adjusted Fisher-Pearson coefficient
//! `G1 = g1 * sqrt(n(n-1)) / (n-2)` with `g1 = m3 / m2^1.5`, and kurtosis is
//! the bias-adjusted excess kurtosis
//! `G2 = ((n+1) g2 + 6) (n-1) / ((n-2)(n-3))` with `g2 = m4 / m2^2 - 3`,
//! where `m2..m4` are population central moments. These match the defaults
//! of the common dataframe libraries, so a normal sample has kurtosis near 0.

use crate::analyzers::types::{StatSummary, Statistic, ValueField};
use crate::analyzers::utility::{central_moments, mean, median_sorted, mode, sample_stddev};
use crate::error::{AnalysisError, Result};
use crate::record::EnrichedRecord;

fn adjusted_skew(n: f64, flat: bool, m2: f64, m3: f64) -> Statistic {
    if n < 3.0 || flat {
        return Statistic::Undefined;
    }
    let g1 = m3 / m2.powf(1.5);
    Statistic::Value(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
}

fn adjusted_excess_kurtosis(n: f64, flat: bool, m2: f64, m4: f64) -> Statistic {
    if n < 4.0 || flat {
        return Statistic::Undefined;
    }
    let g2 = m4 / (m2 * m2) - 3.0;
    Statistic::Value(((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0)))
}

/// Summarizes `values` under the name `column`.
///
/// Statistics that need more values than the sample has (std below two,
/// skew below three, kurtosis below four) come back as
/// [`Statistic::Undefined`] instead of an error, as do skew and kurtosis of
/// a sample with zero spread.
///
/// # Errors
///
/// [`AnalysisError::EmptyData`] for an empty sample,
/// [`AnalysisError::Schema`] when a value is NaN or infinite.
pub fn describe(column: &str, values: &[f64]) -> Result<StatSummary> {
    if values.is_empty() {
        return Err(AnalysisError::empty(format!(
            "cannot describe column '{column}' with no values"
        )));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(AnalysisError::schema(format!(
            "column '{column}' contains non-finite value {bad}"
        )));
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    // Zero spread is decided on the data itself; the moments of a constant
    // sample carry rounding residue whenever its mean is inexact.
    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
    let flat = min == max;

    let n = values.len() as f64;
    let avg = if flat { min } else { mean(values) };
    let (m2, m3, m4) = central_moments(values, avg);
    let std = match sample_stddev(values, avg) {
        Some(_) if flat => Statistic::Value(0.0),
        Some(sd) => Statistic::Value(sd),
        None => Statistic::Undefined,
    };

    // Non-empty input guarantees these are present.
    let median = median_sorted(&sorted).unwrap_or(avg);
    let mode = mode(values).unwrap_or(avg);

    Ok(StatSummary {
        column: column.to_string(),
        count: values.len(),
        mean: avg,
        median,
        mode,
        std,
        min,
        max,
        skew: adjusted_skew(n, flat, m2, m3),
        kurtosis: adjusted_excess_kurtosis(n, flat, m2, m4),
    })
}

/// Summarizes one numeric column of an enriched batch.
pub fn describe_field(records: &[EnrichedRecord], field: ValueField) -> Result<StatSummary> {
    let values: Vec<f64> = records.iter().map(|r| r.value(field)).collect();
    describe(field.column_name(), &values)
}
