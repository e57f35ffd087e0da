use serde::Serialize;

use crate::analyzers::types::{
    CategoricalSummary, GroupedAggregate, PivotMatrix, StatSummary, ValueShare,
};
use crate::error::{AnalysisError, Result};

/// A named group-by result inside a [`Report`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedAggregate {
    pub name: String,
    #[serde(flatten)]
    pub aggregate: GroupedAggregate,
}

/// The complete analysis of one traffic batch. Built once by
/// [`ReportBuilder`] and never modified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    record_count: usize,
    aggregates: Vec<NamedAggregate>,
    pivot: PivotMatrix,
    statistics: Vec<StatSummary>,
    categorical: Vec<CategoricalSummary>,
    shares: Vec<ValueShare>,
}

impl Report {
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn aggregates(&self) -> &[NamedAggregate] {
        &self.aggregates
    }

    pub fn aggregate(&self, name: &str) -> Option<&GroupedAggregate> {
        self.aggregates
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.aggregate)
    }

    pub fn pivot(&self) -> &PivotMatrix {
        &self.pivot
    }

    pub fn statistics(&self) -> &[StatSummary] {
        &self.statistics
    }

    pub fn statistic(&self, column: &str) -> Option<&StatSummary> {
        self.statistics.iter().find(|s| s.column == column)
    }

    pub fn categorical(&self) -> &[CategoricalSummary] {
        &self.categorical
    }

    pub fn categorical_for(&self, column: &str) -> Option<&CategoricalSummary> {
        self.categorical.iter().find(|c| c.column == column)
    }

    pub fn shares(&self) -> &[ValueShare] {
        &self.shares
    }
}

/// Collects the sections of a [`Report`].
///
/// Each section is handed over as the `Result` its producer returned, so the
/// first upstream failure is what [`ReportBuilder::build`] reports. Aggregates,
/// pivot, statistics and categorical sections are required; shares are not.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    record_count: usize,
    aggregates: Vec<NamedAggregate>,
    pivot: Option<PivotMatrix>,
    statistics: Vec<StatSummary>,
    categorical: Vec<CategoricalSummary>,
    shares: Vec<ValueShare>,
    error: Option<AnalysisError>,
}

impl ReportBuilder {
    pub fn new(record_count: usize) -> Self {
        ReportBuilder {
            record_count,
            ..Default::default()
        }
    }

    fn keep<T>(&mut self, section: Result<T>) -> Option<T> {
        match section {
            Ok(v) => Some(v),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e);
                }
                None
            }
        }
    }

    pub fn aggregate(mut self, name: &str, section: Result<GroupedAggregate>) -> Self {
        if let Some(aggregate) = self.keep(section) {
            self.aggregates.push(NamedAggregate {
                name: name.to_string(),
                aggregate,
            });
        }
        self
    }

    pub fn pivot(mut self, section: Result<PivotMatrix>) -> Self {
        if let Some(pivot) = self.keep(section) {
            self.pivot = Some(pivot);
        }
        self
    }

    pub fn statistics(mut self, section: Result<StatSummary>) -> Self {
        if let Some(summary) = self.keep(section) {
            self.statistics.push(summary);
        }
        self
    }

    pub fn categorical(mut self, section: Result<CategoricalSummary>) -> Self {
        if let Some(summary) = self.keep(section) {
            self.categorical.push(summary);
        }
        self
    }

    pub fn share(mut self, section: Result<ValueShare>) -> Self {
        if let Some(share) = self.keep(section) {
            self.shares.push(share);
        }
        self
    }

    /// # Errors
    ///
    /// The first error handed to the builder, otherwise
    /// [`AnalysisError::MissingSection`] for the first required section that
    /// was never supplied.
    pub fn build(self) -> Result<Report> {
        if let Some(e) = self.error {
            return Err(e);
        }
        if self.aggregates.is_empty() {
            return Err(AnalysisError::MissingSection("aggregates"));
        }
        let pivot = self.pivot.ok_or(AnalysisError::MissingSection("pivot"))?;
        if self.statistics.is_empty() {
            return Err(AnalysisError::MissingSection("statistics"));
        }
        if self.categorical.is_empty() {
            return Err(AnalysisError::MissingSection("categorical"));
        }

        Ok(Report {
            record_count: self.record_count,
            aggregates: self.aggregates,
            pivot,
            statistics: self.statistics,
            categorical: self.categorical,
            shares: self.shares,
        })
    }
}
