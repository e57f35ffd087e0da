pub mod analyzers;
pub mod config;
pub mod error;
pub mod features;
pub mod ingest;
pub mod output;
pub mod record;

pub use analyzers::analyzer::{analyze, build_report};
pub use analyzers::report::Report;
pub use error::{AnalysisError, Result};
