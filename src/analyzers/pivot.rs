use crate::analyzers::aggregate::{EmptyGroups, GroupBy};
use crate::analyzers::types::{
    AggFn, CellValue, GroupKey, KeyField, KeyValue, PivotMatrix, ValueField,
};
use crate::error::Result;
use crate::features::WEEKDAYS;
use crate::record::EnrichedRecord;
use chrono::Weekday;

/// Builds the weekday-by-hour heatmap table of one aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PivotBuilder {
    value: ValueField,
    function: AggFn,
}

impl PivotBuilder {
    pub fn new(value: ValueField, function: AggFn) -> Self {
        PivotBuilder { value, function }
    }

    /// Fill for a (day, hour) with no records: zero for sums and counts,
    /// [`CellValue::NoData`] for means.
    pub fn fill(&self) -> CellValue {
        match self.function {
            AggFn::Sum | AggFn::Count => CellValue::Observed(0.0),
            AggFn::Mean => CellValue::NoData,
        }
    }

    /// # Errors
    ///
    /// [`crate::error::AnalysisError::EmptyData`] with no records.
    pub fn build(&self, records: &[EnrichedRecord]) -> Result<PivotMatrix> {
        let grouped = GroupBy::new(&[KeyField::DayOfWeek, KeyField::Hour], self.value, self.function)
            .canonical(EmptyGroups::Omit)?
            .run(records)?;

        let columns: Vec<u32> = (0..24).collect();
        let cells = WEEKDAYS
            .iter()
            .map(|day| {
                columns
                    .iter()
                    .map(|hour| {
                        let key = GroupKey(vec![KeyValue::Day(*day), KeyValue::Hour(*hour)]);
                        grouped
                            .get(&key, self.function)
                            .unwrap_or_else(|| self.fill())
                    })
                    .collect()
            })
            .collect();

        Ok(PivotMatrix {
            value: self.value,
            function: self.function,
            rows: WEEKDAYS.iter().copied().map(KeyValue::Day).collect(),
            columns,
            cells,
        })
    }
}

impl PivotMatrix {
    pub fn cell(&self, day: Weekday, hour: u32) -> Option<CellValue> {
        let row = WEEKDAYS.iter().position(|d| *d == day)?;
        self.cells.get(row)?.get(hour as usize).copied()
    }

    /// Sum of every observed cell.
    pub fn total(&self) -> f64 {
        self.cells
            .iter()
            .flatten()
            .filter_map(|c| c.as_f64())
            .sum()
    }

    /// Sum of observed cells per weekday, Monday first.
    pub fn row_totals(&self) -> Vec<f64> {
        self.cells
            .iter()
            .map(|row| row.iter().filter_map(|c| c.as_f64()).sum())
            .collect()
    }

    /// Sum of observed cells per hour, 0 first.
    pub fn column_totals(&self) -> Vec<f64> {
        (0..self.columns.len())
            .map(|col| {
                self.cells
                    .iter()
                    .filter_map(|row| row.get(col).and_then(|c| c.as_f64()))
                    .sum()
            })
            .collect()
    }
}
