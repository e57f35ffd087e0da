use crate::analyzers::aggregate::GroupBy;
use crate::analyzers::types::{
    AggFn, CategoricalSummary, FrequencyEntry, KeyField, ShareEntry, ValueField, ValueShare,
};
use crate::analyzers::utility::{pct, round_to};
use crate::error::{AnalysisError, Result};
use crate::record::EnrichedRecord;
use std::collections::HashMap;

/// Counts each distinct value of a categorical column.
///
/// Entries are ordered by descending count; equal counts keep the order in
/// which the values first appeared. Percentages are rounded to two places.
///
/// # Errors
///
/// [`AnalysisError::EmptyData`] when `values` is empty.
pub fn frequency<I, S>(column: &str, values: I) -> Result<CategoricalSummary>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for value in values {
        let value = value.as_ref();
        match index.get(value) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(value.to_string(), counts.len());
                counts.push((value.to_string(), 1));
            }
        }
    }

    let total: usize = counts.iter().map(|(_, c)| c).sum();
    if total == 0 {
        return Err(AnalysisError::empty(format!(
            "cannot count categories of column '{column}' with no values"
        )));
    }

    // Stable sort keeps first-occurrence order among ties.
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let entries = counts
        .into_iter()
        .map(|(value, count)| FrequencyEntry {
            value,
            count,
            percentage: round_to(pct(count as f64, total as f64), 2),
        })
        .collect();

    Ok(CategoricalSummary {
        column: column.to_string(),
        total,
        entries,
    })
}

/// Value distribution of one key column of an enriched batch.
pub fn frequency_of(records: &[EnrichedRecord], field: KeyField) -> Result<CategoricalSummary> {
    frequency(
        field.column_name(),
        records.iter().map(|r| r.key(field).to_string()),
    )
}

/// Splits the total of `value` across the groups of `key`, first-seen order.
/// A zero total gives every group 0%.
pub fn share_of(records: &[EnrichedRecord], key: KeyField, value: ValueField) -> Result<ValueShare> {
    let grouped = GroupBy::new(&[key], value, AggFn::Sum).run(records)?;
    let total = grouped.total(AggFn::Sum);

    let entries = grouped
        .column(AggFn::Sum)
        .into_iter()
        .map(|(group, cell)| {
            let part = cell.as_f64().unwrap_or(0.0);
            ShareEntry {
                key: group.to_string(),
                value: part,
                percentage: round_to(pct(part, total), 2),
            }
        })
        .collect();

    Ok(ValueShare {
        key,
        value,
        total,
        entries,
    })
}
