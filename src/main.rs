//! CLI entry point for the traffic insights tool.
//!
//! Provides subcommands for building a full report from a sensor CSV and for
//! inspecting the pivot, one column's statistics or one category's
//! distribution on the terminal.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use traffic_insights::analyzers::analyzer::analyze;
use traffic_insights::analyzers::describe::describe_field;
use traffic_insights::analyzers::frequency::frequency_of;
use traffic_insights::analyzers::pivot::PivotBuilder;
use traffic_insights::analyzers::types::{AggFn, KeyField, ValueField};
use traffic_insights::config::AnalysisConfig;
use traffic_insights::features::{RowPolicy, enrich};
use traffic_insights::ingest::{CsvSource, RecordSource};
use traffic_insights::output::{CsvDirSink, JsonFileSink, ReportSink, render_pivot};
use traffic_insights::record::EnrichedRecord;

#[derive(Parser)]
#[command(name = "traffic_insights")]
#[command(about = "Aggregate and summarize traffic sensor data", long_about = None)]
struct Cli {
    /// Optional JSON file with analysis settings
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Drop invalid rows instead of failing the whole batch
    #[arg(long, global = true, default_value_t = false)]
    skip_invalid: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full report and write it as JSON
    Analyze {
        /// Sensor CSV file
        #[arg(value_name = "FILE")]
        input: String,

        /// JSON file to write the report to
        #[arg(short, long, default_value = "report.json")]
        output: String,

        /// Gzip compress the JSON report
        #[arg(long, default_value_t = false)]
        gzip: bool,

        /// Optional: also write every table as CSV into this directory
        #[arg(long)]
        csv_dir: Option<String>,
    },
    /// Print the weekday-by-hour table
    Pivot {
        #[arg(value_name = "FILE")]
        input: String,

        #[arg(short, long, value_enum, default_value_t = ColumnArg::VehicleCount)]
        value: ColumnArg,

        #[arg(short, long, value_enum, default_value_t = FunctionArg::Sum)]
        function: FunctionArg,
    },
    /// Print descriptive statistics for a numeric column
    Describe {
        #[arg(value_name = "FILE")]
        input: String,

        #[arg(value_enum)]
        column: ColumnArg,
    },
    /// Print the value distribution of a categorical column
    Frequency {
        #[arg(value_name = "FILE")]
        input: String,

        #[arg(value_enum)]
        column: CategoryArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ColumnArg {
    VehicleCount,
    AverageSpeed,
}

impl From<ColumnArg> for ValueField {
    fn from(arg: ColumnArg) -> Self {
        match arg {
            ColumnArg::VehicleCount => ValueField::VehicleCount,
            ColumnArg::AverageSpeed => ValueField::AverageSpeed,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FunctionArg {
    Sum,
    Mean,
    Count,
}

impl From<FunctionArg> for AggFn {
    fn from(arg: FunctionArg) -> Self {
        match arg {
            FunctionArg::Sum => AggFn::Sum,
            FunctionArg::Mean => AggFn::Mean,
            FunctionArg::Count => AggFn::Count,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum CategoryArg {
    Weather,
    Intersection,
    HourCategory,
    DayOfWeek,
    Month,
    Hour,
}

impl From<CategoryArg> for KeyField {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Weather => KeyField::Weather,
            CategoryArg::Intersection => KeyField::Intersection,
            CategoryArg::HourCategory => KeyField::HourCategory,
            CategoryArg::DayOfWeek => KeyField::DayOfWeek,
            CategoryArg::Month => KeyField::Month,
            CategoryArg::Hour => KeyField::Hour,
        }
    }
}

/// Fans one report out to several sinks.
struct Sinks(Vec<Box<dyn ReportSink>>);

#[async_trait::async_trait]
impl ReportSink for Sinks {
    async fn publish(&self, report: &traffic_insights::Report) -> traffic_insights::Result<()> {
        for sink in &self.0 {
            sink.publish(report).await?;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/traffic_insights.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("traffic_insights.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };
    if cli.skip_invalid {
        config.row_policy = RowPolicy::SkipInvalid;
    }

    match cli.command {
        Commands::Analyze {
            input,
            output,
            gzip,
            csv_dir,
        } => {
            let mut sinks: Vec<Box<dyn ReportSink>> = vec![Box::new(JsonFileSink::new(output, gzip))];
            if let Some(dir) = csv_dir {
                sinks.push(Box::new(CsvDirSink::new(dir)));
            }

            let report = analyze(&CsvSource::new(input), &Sinks(sinks), &config).await?;
            info!(records = report.record_count(), "Analysis complete");
        }
        Commands::Pivot {
            input,
            value,
            function,
        } => {
            let records = load_records(&input, &config).await?;
            let pivot = PivotBuilder::new(value.into(), function.into()).build(&records)?;

            info!(
                value = %pivot.value,
                function = %pivot.function,
                total = pivot.total(),
                "Pivot table\n{}",
                render_pivot(&pivot)
            );
        }
        Commands::Describe { input, column } => {
            let records = load_records(&input, &config).await?;
            let s = describe_field(&records, column.into())?;

            info!(
                column = %s.column,
                count = s.count,
                mean = s.mean,
                median = s.median,
                mode = s.mode,
                std = %s.std,
                min = s.min,
                max = s.max,
                skew = %s.skew,
                kurtosis = %s.kurtosis,
                "Descriptive statistics"
            );
        }
        Commands::Frequency { input, column } => {
            let records = load_records(&input, &config).await?;
            let summary = frequency_of(&records, column.into())?;

            info!(column = %summary.column, total = summary.total, "Value distribution");
            for entry in &summary.entries {
                info!(
                    value = %entry.value,
                    count = entry.count,
                    percentage = entry.percentage,
                    "Category"
                );
            }
        }
    }

    Ok(())
}

/// Reads and enriches a sensor CSV for the inspection subcommands.
#[tracing::instrument(skip(config))]
async fn load_records(input: &str, config: &AnalysisConfig) -> Result<Vec<EnrichedRecord>> {
    let raws = CsvSource::new(input).load().await?;
    Ok(enrich(&raws, config.row_policy)?)
}
