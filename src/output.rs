//! Report sinks: where a finished [`Report`] goes.
//!
//! Supports logging, pretty JSON files (optionally gzip-compressed) and a
//! directory of CSV tables ready for charting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::report::Report;
use crate::analyzers::types::{GroupedAggregate, PivotMatrix};
use crate::error::Result;

/// Receives the finished report.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn publish(&self, report: &Report) -> Result<()>;
}

/// What gets written to disk: the report stamped with its export time.
#[derive(Debug, Serialize)]
pub struct ReportEnvelope<'a> {
    pub generated_at: DateTime<Utc>,
    pub report: &'a Report,
}

/// Logs the report as pretty-printed JSON.
pub struct LogSink;

#[async_trait]
impl ReportSink for LogSink {
    async fn publish(&self, report: &Report) -> Result<()> {
        debug!("{:#?}", report);
        info!("{}", serde_json::to_string_pretty(report)?);
        Ok(())
    }
}

/// Writes the report as a JSON document, gzip-compressed when `gzip` is set.
pub struct JsonFileSink {
    pub path: PathBuf,
    pub gzip: bool,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>, gzip: bool) -> Self {
        Self {
            path: path.into(),
            gzip,
        }
    }

    /// Final file name; gzip output always ends in `.gz`.
    pub fn target(&self) -> PathBuf {
        let is_gz = self.path.extension().and_then(|e| e.to_str()) == Some("gz");
        if self.gzip && !is_gz {
            let mut name = self.path.clone().into_os_string();
            name.push(".gz");
            PathBuf::from(name)
        } else {
            self.path.clone()
        }
    }
}

#[async_trait]
impl ReportSink for JsonFileSink {
    #[tracing::instrument(skip(self, report), fields(path = %self.path.display(), gzip = self.gzip))]
    async fn publish(&self, report: &Report) -> Result<()> {
        let envelope = ReportEnvelope {
            generated_at: Utc::now(),
            report,
        };
        let body = serde_json::to_vec_pretty(&envelope)?;

        let body = if self.gzip {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&body)?;
            encoder.finish()?
        } else {
            body
        };

        let target = self.target();
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &body)?;

        info!(path = %target.display(), bytes = body.len(), "Report written");
        Ok(())
    }
}

/// Writes one CSV per report table into a directory.
///
/// Produces `<aggregate name>.csv` for each aggregate, `pivot.csv`,
/// `statistics.csv` and `frequency_<column>.csv`.
pub struct CsvDirSink {
    pub dir: PathBuf,
}

impl CsvDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

/// Writes a group-by result as `key columns..., function, value` rows.
/// Unobserved values are written as empty cells.
pub fn write_aggregate_csv(path: &Path, aggregate: &GroupedAggregate) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;

    let mut header: Vec<&str> = aggregate.keys.iter().map(|k| k.column_name()).collect();
    header.extend(["function", aggregate.value.column_name()]);
    writer.write_record(&header)?;

    for result in &aggregate.results {
        let mut row: Vec<String> = result.key.0.iter().map(|v| v.to_string()).collect();
        row.push(result.function.to_string());
        row.push(result.value.as_f64().map(|v| v.to_string()).unwrap_or_default());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the pivot as one row per weekday and one column per hour.
pub fn write_pivot_csv(path: &Path, pivot: &PivotMatrix) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;

    let mut header = vec!["day_of_week".to_string()];
    header.extend(pivot.columns.iter().map(|h| h.to_string()));
    writer.write_record(&header)?;

    for (day, cells) in pivot.rows.iter().zip(&pivot.cells) {
        let mut row = vec![day.to_string()];
        row.extend(
            cells
                .iter()
                .map(|c| c.as_f64().map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[async_trait]
impl ReportSink for CsvDirSink {
    #[tracing::instrument(skip(self, report), fields(dir = %self.dir.display()))]
    async fn publish(&self, report: &Report) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        for named in report.aggregates() {
            write_aggregate_csv(&self.dir.join(format!("{}.csv", named.name)), &named.aggregate)?;
        }
        write_pivot_csv(&self.dir.join("pivot.csv"), report.pivot())?;
        write_rows(&self.dir.join("statistics.csv"), report.statistics())?;
        for summary in report.categorical() {
            write_rows(
                &self.dir.join(format!("frequency_{}.csv", summary.column)),
                &summary.entries,
            )?;
        }

        info!(tables = report.aggregates().len() + report.categorical().len() + 2, "CSV tables written");
        Ok(())
    }
}

/// Renders a pivot as a fixed-width text table for terminal output.
pub fn render_pivot(pivot: &PivotMatrix) -> String {
    let mut out = format!("{:<10}", "");
    for hour in &pivot.columns {
        out.push_str(&format!("{hour:>8}"));
    }
    out.push('\n');

    for (day, cells) in pivot.rows.iter().zip(&pivot.cells) {
        out.push_str(&format!("{:<10}", day.to_string()));
        for cell in cells {
            match cell.as_f64() {
                Some(v) => out.push_str(&format!("{v:>8.1}")),
                None => out.push_str(&format!("{:>8}", "-")),
            }
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::analyzer::build_report;
    use crate::config::AnalysisConfig;
    use crate::features::{RowPolicy, enrich};
    use crate::record::RawRecord;
    use flate2::read::GzDecoder;
    use std::env;
    use std::io::Read;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn report() -> Report {
        let raws = vec![
            RawRecord::new("2024-03-04 08:00:00", "A", 10, 30.0, "Clear"),
            RawRecord::new("2024-03-04 08:30:00", "A", 20, 20.0, "Clear"),
            RawRecord::new("2024-03-05 18:00:00", "B", 5, 50.0, "Rain"),
        ];
        let records = enrich(&raws, RowPolicy::FailFast).unwrap();
        build_report(&records, &AnalysisConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_log_sink_does_not_fail() {
        LogSink.publish(&report()).await.unwrap();
    }

    #[tokio::test]
    async fn test_json_sink_writes_envelope() {
        let path = temp_path("traffic_insights_test_report.json");
        let _ = fs::remove_file(&path);

        JsonFileSink::new(&path, false).publish(&report()).await.unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(json.get("generated_at").is_some());
        assert_eq!(json["report"]["record_count"], 3);

        fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_json_sink_gzip() {
        let path = temp_path("traffic_insights_test_report_gz.json");
        let sink = JsonFileSink::new(&path, true);
        let target = sink.target();
        assert!(target.to_string_lossy().ends_with(".json.gz"));
        let _ = fs::remove_file(&target);

        sink.publish(&report()).await.unwrap();

        let mut decoded = String::new();
        GzDecoder::new(fs::File::open(&target).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.contains("\"pivot\""));

        fs::remove_file(&target).unwrap();
    }

    #[tokio::test]
    async fn test_csv_dir_sink_writes_tables() {
        let dir = temp_path("traffic_insights_test_tables");
        let _ = fs::remove_dir_all(&dir);

        CsvDirSink::new(&dir).publish(&report()).await.unwrap();

        let by_intersection = fs::read_to_string(dir.join("by_intersection.csv")).unwrap();
        let lines: Vec<_> = by_intersection.lines().collect();
        assert_eq!(lines[0], "intersection_name,function,vehicle_count");
        assert_eq!(lines[1], "A,sum,30");
        assert_eq!(lines[2], "B,sum,5");

        let pivot = fs::read_to_string(dir.join("pivot.csv")).unwrap();
        assert_eq!(pivot.lines().count(), 8);
        assert!(pivot.lines().nth(1).unwrap().starts_with("Monday,0,"));

        assert!(dir.join("statistics.csv").exists());
        assert!(dir.join("frequency_weather_condition.csv").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_render_pivot() {
        let text = render_pivot(report().pivot());
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines.len(), 8);
        assert!(lines[1].starts_with("Monday"));
        assert!(lines[1].contains("30.0"));
        assert!(lines[7].starts_with("Sunday"));
    }
}
