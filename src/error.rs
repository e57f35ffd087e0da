//! Error taxonomy shared by ingestion, enrichment and the analyzers.

/// Errors raised while turning raw traffic rows into a report.
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    /// A timestamp could not be parsed.
    #[error("row {row}: cannot parse timestamp '{value}'")]
    Parse { row: usize, value: String },

    /// A required field is missing or holds a value of the wrong type.
    #[error("schema error: {0}")]
    Schema(String),

    /// A statistic or aggregation was asked to run over zero values.
    #[error("no data: {0}")]
    EmptyData(String),

    /// A statistic is not defined for the sample it was computed over.
    #[error("{statistic} is undefined for a sample of {n} value(s)")]
    UndefinedStatistic { statistic: &'static str, n: usize },

    /// A required report section was never supplied.
    #[error("report section '{0}' is missing")]
    MissingSection(&'static str),

    /// A background analysis task failed to complete.
    #[error("analysis worker failed: {0}")]
    Worker(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub(crate) fn schema(message: impl Into<String>) -> Self {
        AnalysisError::Schema(message.into())
    }

    pub(crate) fn empty(context: impl Into<String>) -> Self {
        AnalysisError::EmptyData(context.into())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
