//! Record sources: where raw traffic rows come from.

use async_trait::async_trait;
use std::io::Read;
use tracing::debug;

use crate::error::Result;
use crate::record::RawRecord;

/// Supplies the raw batch to analyze.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn load(&self) -> Result<Vec<RawRecord>>;
}

/// Decodes CSV rows with a header line into [`RawRecord`]s.
///
/// Columns are matched by header name; unknown columns are ignored and
/// missing ones are left empty for validation to report.
///
/// # Errors
///
/// Returns an error if the input is not well-formed CSV.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<RawRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: RawRecord = result?;
        rows.push(record);
    }

    Ok(rows)
}

/// Reads a CSV file from disk.
pub struct CsvSource {
    path: String,
}

impl CsvSource {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl RecordSource for CsvSource {
    #[tracing::instrument(skip(self), fields(path = %self.path))]
    async fn load(&self) -> Result<Vec<RawRecord>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let rows = parse_csv(bytes.as_slice())?;
        debug!(rows = rows.len(), "CSV rows loaded");
        Ok(rows)
    }
}

/// Serves a batch that is already in memory.
pub struct MemorySource(pub Vec<RawRecord>);

#[async_trait]
impl RecordSource for MemorySource {
    async fn load(&self) -> Result<Vec<RawRecord>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;

    #[test]
    fn test_parse_csv_by_header() {
        let data = "\
timestamp,intersection_name,vehicle_count,average_speed,weather_condition,extra
2024-03-04 08:00:00,Civil Lines,12,33.5,Clear,x
2024-03-04 09:00:00, Katra ,7,21.0,Rain,y
";
        let rows = parse_csv(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].vehicle_count.as_deref(), Some("12"));
        assert_eq!(rows[1].intersection_name.as_deref(), Some("Katra"));
    }

    #[test]
    fn test_parse_csv_missing_column_stays_empty() {
        let data = "timestamp,intersection_name,vehicle_count,average_speed\n2024-03-04 08:00:00,A,1,2\n";
        let rows = parse_csv(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].weather_condition, None);
    }

    #[test]
    fn test_parse_csv_ragged_row_fails() {
        let data = "timestamp,intersection_name\n2024-03-04 08:00:00,A,extra\n";
        assert!(matches!(parse_csv(data.as_bytes()), Err(AnalysisError::Csv(_))));
    }

    #[tokio::test]
    async fn test_memory_source() {
        let src = MemorySource(vec![RawRecord::new("2024-03-04 08:00:00", "A", 1, 2.0, "Clear")]);
        assert_eq!(src.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_csv_source_missing_file() {
        let src = CsvSource::new("/definitely/not/here.csv");
        assert!(matches!(src.load().await, Err(AnalysisError::Io(_))));
    }
}
