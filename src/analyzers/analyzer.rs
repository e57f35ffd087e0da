use crate::analyzers::aggregate::{EmptyGroups, GroupBy};
use crate::analyzers::describe::describe_field;
use crate::analyzers::frequency::{frequency_of, share_of};
use crate::analyzers::pivot::PivotBuilder;
use crate::analyzers::report::{Report, ReportBuilder};
use crate::analyzers::types::{
    AggFn, CategoricalSummary, GroupedAggregate, KeyField, PivotMatrix, StatSummary, ValueField,
    ValueShare,
};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::features::enrich;
use crate::ingest::RecordSource;
use crate::output::ReportSink;
use crate::record::EnrichedRecord;
use std::sync::Arc;
use tracing::{debug, info};

type NamedSection = (&'static str, Result<GroupedAggregate>);

/// The standard group-by tables of a traffic report.
fn aggregate_sections(records: &[EnrichedRecord], config: &AnalysisConfig) -> Vec<NamedSection> {
    let weekdays = if config.empty_weekdays {
        EmptyGroups::Include
    } else {
        EmptyGroups::Omit
    };

    vec![
        (
            "by_hour",
            GroupBy::new(&[KeyField::Hour], ValueField::VehicleCount, AggFn::Sum)
                .canonical(EmptyGroups::Omit)
                .and_then(|g| g.run(records)),
        ),
        (
            "by_intersection",
            GroupBy::new(&[KeyField::Intersection], ValueField::VehicleCount, AggFn::Sum)
                .run(records),
        ),
        (
            "by_day_of_week",
            GroupBy::new(&[KeyField::DayOfWeek], ValueField::VehicleCount, AggFn::Sum)
                .canonical(weekdays)
                .and_then(|g| g.run(records)),
        ),
        (
            "by_hour_category",
            GroupBy::new(&[KeyField::HourCategory], ValueField::VehicleCount, AggFn::Sum)
                .also(AggFn::Mean)
                .canonical(EmptyGroups::Omit)
                .and_then(|g| g.run(records)),
        ),
        (
            "by_month",
            GroupBy::new(&[KeyField::Month], ValueField::VehicleCount, AggFn::Sum)
                .canonical(EmptyGroups::Omit)
                .and_then(|g| g.run(records)),
        ),
        (
            "speed_by_weather",
            GroupBy::new(&[KeyField::Weather], ValueField::AverageSpeed, AggFn::Mean)
                .also(AggFn::Count)
                .run(records),
        ),
    ]
}

fn pivot_section(records: &[EnrichedRecord], config: &AnalysisConfig) -> Result<PivotMatrix> {
    PivotBuilder::new(config.pivot_value, config.pivot_function).build(records)
}

fn statistics_sections(
    records: &[EnrichedRecord],
    config: &AnalysisConfig,
) -> Vec<Result<StatSummary>> {
    config
        .statistics_columns
        .iter()
        .map(|field| describe_field(records, *field))
        .collect()
}

fn categorical_sections(
    records: &[EnrichedRecord],
    config: &AnalysisConfig,
) -> (Vec<Result<CategoricalSummary>>, Result<ValueShare>) {
    let summaries = config
        .categorical_columns
        .iter()
        .map(|field| frequency_of(records, *field))
        .collect();
    let share = share_of(records, KeyField::Intersection, ValueField::VehicleCount);
    (summaries, share)
}

fn assemble(
    record_count: usize,
    aggregates: Vec<NamedSection>,
    pivot: Result<PivotMatrix>,
    statistics: Vec<Result<StatSummary>>,
    (categorical, share): (Vec<Result<CategoricalSummary>>, Result<ValueShare>),
) -> Result<Report> {
    let mut builder = ReportBuilder::new(record_count);
    for (name, section) in aggregates {
        builder = builder.aggregate(name, section);
    }
    builder = builder.pivot(pivot);
    for section in statistics {
        builder = builder.statistics(section);
    }
    for section in categorical {
        builder = builder.categorical(section);
    }
    builder.share(share).build()
}

/// Computes every report section on the calling thread.
pub fn build_report(records: &[EnrichedRecord], config: &AnalysisConfig) -> Result<Report> {
    assemble(
        records.len(),
        aggregate_sections(records, config),
        pivot_section(records, config),
        statistics_sections(records, config),
        categorical_sections(records, config),
    )
}

fn spawn_section<T, F>(
    records: &Arc<[EnrichedRecord]>,
    config: &AnalysisConfig,
    section: F,
) -> tokio::task::JoinHandle<T>
where
    T: Send + 'static,
    F: FnOnce(&[EnrichedRecord], &AnalysisConfig) -> T + Send + 'static,
{
    let records = Arc::clone(records);
    let config = config.clone();
    tokio::task::spawn_blocking(move || section(&records, &config))
}

fn joined<T>(res: std::result::Result<T, tokio::task::JoinError>) -> Result<T> {
    res.map_err(|e| AnalysisError::Worker(e.to_string()))
}

/// Computes the report sections on blocking worker threads, one task per
/// section family, and assembles them once all have finished. Produces the
/// same report as [`build_report`].
pub async fn build_report_concurrent(
    records: Arc<[EnrichedRecord]>,
    config: &AnalysisConfig,
) -> Result<Report> {
    let (aggregates, pivot, statistics, categorical) = tokio::join!(
        spawn_section(&records, config, aggregate_sections),
        spawn_section(&records, config, pivot_section),
        spawn_section(&records, config, statistics_sections),
        spawn_section(&records, config, categorical_sections),
    );
    debug!("All analysis workers joined");

    assemble(
        records.len(),
        joined(aggregates)?,
        joined(pivot)?,
        joined(statistics)?,
        joined(categorical)?,
    )
}

/// Loads a batch from `source`, enriches it, builds the report and hands it
/// to `sink`. Nothing is published if any step fails.
#[tracing::instrument(skip_all, fields(row_policy = ?config.row_policy))]
pub async fn analyze<S, K>(source: &S, sink: &K, config: &AnalysisConfig) -> Result<Report>
where
    S: RecordSource + ?Sized,
    K: ReportSink + ?Sized,
{
    let raws = source.load().await?;
    info!(rows = raws.len(), "Raw batch loaded");

    let records: Arc<[EnrichedRecord]> = enrich(&raws, config.row_policy)?.into();
    info!(records = records.len(), "Batch enriched");

    let report = build_report_concurrent(records, config).await?;
    sink.publish(&report).await?;

    info!(
        aggregates = report.aggregates().len(),
        statistics = report.statistics().len(),
        categorical = report.categorical().len(),
        "Report published"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{CellValue, GroupKey, KeyValue};
    use crate::ingest::MemorySource;
    use crate::record::RawRecord;
    use async_trait::async_trait;
    use chrono::Weekday;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl ReportSink for RecordingSink {
        async fn publish(&self, report: &Report) -> Result<()> {
            self.published.lock().unwrap().push(report.record_count());
            Ok(())
        }
    }

    fn raws() -> Vec<RawRecord> {
        vec![
            RawRecord::new("2024-03-04 08:00:00", "A", 10, 30.0, "Clear"),
            RawRecord::new("2024-03-04 17:30:00", "A", 20, 20.0, "Rain"),
            RawRecord::new("2024-03-09 08:15:00", "B", 5, 55.0, "Clear"),
        ]
    }

    #[test]
    fn test_build_report_sections() {
        let records = enrich(&raws(), Default::default()).unwrap();
        let report = build_report(&records, &AnalysisConfig::default()).unwrap();

        let by_intersection = report.aggregate("by_intersection").unwrap();
        assert_eq!(
            by_intersection.get(&GroupKey::single("A"), AggFn::Sum),
            Some(CellValue::Observed(30.0))
        );
        assert_eq!(
            by_intersection.get(&GroupKey::single("B"), AggFn::Sum),
            Some(CellValue::Observed(5.0))
        );

        let by_day = report.aggregate("by_day_of_week").unwrap();
        assert_eq!(by_day.groups().len(), 7);
        assert_eq!(
            by_day.get(&GroupKey::from(KeyValue::Day(Weekday::Sat)), AggFn::Sum),
            Some(CellValue::Observed(5.0))
        );

        let by_hour = report.aggregate("by_hour").unwrap();
        let hours: Vec<_> = by_hour.groups().into_iter().map(|k| k.to_string()).collect();
        assert_eq!(hours, vec!["8", "17"]);

        assert_eq!(report.statistics().len(), 2);
        assert_eq!(report.categorical().len(), 4);
        assert_eq!(report.shares()[0].entries[0].percentage, 85.71);
    }

    #[test]
    fn test_weekday_table_can_omit_empty_days() {
        let records = enrich(&raws(), Default::default()).unwrap();
        let config = AnalysisConfig {
            empty_weekdays: false,
            ..Default::default()
        };
        let report = build_report(&records, &config).unwrap();

        assert_eq!(report.aggregate("by_day_of_week").unwrap().groups().len(), 2);
    }

    #[test]
    fn test_empty_column_list_is_missing_section() {
        let records = enrich(&raws(), Default::default()).unwrap();
        let config = AnalysisConfig {
            statistics_columns: vec![],
            ..Default::default()
        };

        assert!(matches!(
            build_report(&records, &config),
            Err(AnalysisError::MissingSection("statistics"))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let records: Arc<[EnrichedRecord]> = enrich(&raws(), Default::default()).unwrap().into();
        let config = AnalysisConfig::default();

        let sequential = build_report(&records, &config).unwrap();
        let concurrent = build_report_concurrent(records, &config).await.unwrap();
        assert_eq!(sequential, concurrent);
    }

    #[tokio::test]
    async fn test_analyze_publishes_once() {
        let sink = RecordingSink::default();
        let report = analyze(&MemorySource(raws()), &sink, &AnalysisConfig::default())
            .await
            .unwrap();

        assert_eq!(report.record_count(), 3);
        assert_eq!(*sink.published.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_analyze_failure_publishes_nothing() {
        let mut rows = raws();
        rows.push(RawRecord::new("31/31/2024", "C", 1, 1.0, "Clear"));
        let sink = RecordingSink::default();

        let err = analyze(&MemorySource(rows), &sink, &AnalysisConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Parse { row: 4, .. }));
        assert!(sink.published.lock().unwrap().is_empty());
    }
}
