use std::cell::Cell;
use std::fs;

use chrono::NaiveDate;
use serde_json::json;
use tempfile::tempdir;

use trainload_core::report::format_outcome;
use trainload_core::{
    read_payload_dir, run_directory, DateRange, DedupPolicy, ExtractError, HistoryStore,
    MemoryHistoryStore, Pipeline, PipelineConfig, RawPayload, StoreError, WorkoutRecord, WorkoutSeries,
};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
}

fn write_json(dir: &std::path::Path, name: &str, value: serde_json::Value) {
    fs::write(dir.join(name), value.to_string()).unwrap();
}

fn sample_payloads() -> Vec<RawPayload> {
    vec![
        RawPayload::new(
            "a.json",
            json!({ "summary": {
                "start_time": "2025-07-08 06:45:00", "duration": 10800, "distance": 18790,
                "heart_rate": { "average": 112 }, "calories": 1686 } }),
        ),
        RawPayload::new(
            "b.json",
            json!({ "startTime": "2025-07-10T07:12:00", "duration": "PT4920S",
                    "distance": 7180, "kiloCalories": 750, "heartRate": { "avg": 112 } }),
        ),
        RawPayload::new("c.json", json!({ "distance_km": 2.0 })),
    ]
}

#[test]
fn reads_directory_in_name_order_and_reports_bad_files() {
    let dir = tempdir().unwrap();
    write_json(dir.path(), "b.json", json!([{ "date": "2025-07-09" }, { "date": "2025-07-11" }]));
    write_json(dir.path(), "a.json", json!({ "date": "2025-07-08" }));
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let batch = read_payload_dir(dir.path()).unwrap();
    let sources: Vec<&str> = batch.payloads.iter().map(|p| p.source.as_str()).collect();
    assert_eq!(sources, vec!["a.json", "b.json#0", "b.json#1"]);
    assert_eq!(batch.failures.len(), 1);
    assert_eq!(batch.failures[0].source, "broken.json");
    assert!(matches!(batch.failures[0].reason, ExtractError::InvalidJson(_)));
}

#[test]
fn run_produces_rows_and_counts() {
    let mut pipeline = Pipeline::in_memory(PipelineConfig::default()).unwrap();
    let outcome = pipeline.run(&sample_payloads(), None).unwrap();

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].source, "c.json");
    let report = outcome.report().expect("ready");
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.aggregate.days.len(), 3);
    assert!((report.rows[1].duration_hours - 1.37).abs() < 1e-9);

    let m = pipeline.metrics();
    assert_eq!(m.payloads_total.get(), 3);
    assert_eq!(m.records_extracted_total.get(), 2);
    assert_eq!(m.extraction_failures_total.get(), 1);

    // samme batch igjen: alt er duplikater
    let again = pipeline.run(&sample_payloads(), None).unwrap();
    assert_eq!(again.report().unwrap().series.len(), 2);
    assert_eq!(pipeline.metrics().duplicates_dropped_total.get(), 2);
    assert!(pipeline.metrics().encode_text().contains("trainload_duplicates_dropped_total 2"));
}

#[test]
fn range_filters_rows_but_not_windows() {
    let mut pipeline = Pipeline::in_memory(PipelineConfig::default()).unwrap();
    let outcome = pipeline.run(&sample_payloads(), Some(DateRange::new(day(10), day(31)))).unwrap();
    let report = outcome.report().unwrap();
    assert_eq!(report.rows.len(), 1);
    // 07-08 er fortsatt med i snittene
    assert_eq!(report.aggregate.daily.len(), 3);
    assert!((report.rows[0].acwr.unwrap() - 1.0).abs() < 1e-12);
}

#[test]
fn empty_range_and_empty_input_are_no_data() {
    let mut pipeline = Pipeline::in_memory(PipelineConfig::default()).unwrap();
    let outcome = pipeline.run(&sample_payloads(), Some(DateRange::new(day(20), day(21)))).unwrap();
    assert!(outcome.is_no_data());

    let mut fresh = Pipeline::in_memory(PipelineConfig::default()).unwrap();
    let outcome = fresh.run(&[], None).unwrap();
    assert!(outcome.is_no_data());
    assert!(format_outcome(&outcome).starts_with("No valid data loaded."));
    assert_eq!(fresh.metrics().no_data_total.get(), 1);
}

#[test]
fn run_directory_uses_config_relative_paths() {
    let root = tempdir().unwrap();
    let data = root.path().join("data");
    fs::create_dir(&data).unwrap();
    for p in sample_payloads() {
        write_json(&data, &p.source, p.value);
    }
    fs::write(data.join("zz.json"), "[").unwrap();
    let config_path = root.path().join("trainload.json");
    write_json(
        root.path(),
        "trainload.json",
        json!({
            "windows": { "short_days": 3, "long_days": 7 },
            "data_dir": "data",
            "history_path": "history.csv"
        }),
    );

    let outcome = run_directory(&config_path, None).unwrap();
    assert_eq!(outcome.failures.len(), 2);
    let report = outcome.report().unwrap();
    assert_eq!(report.aggregate.windows.long_days(), 7);
    assert!(root.path().join("history.csv").exists());

    let text = format_outcome(&outcome);
    assert!(text.contains("--- Training Load Report ---"), "{text}");
    assert!(text.contains("dropped zz.json"), "{text}");

    // andre kjør: historikken vokser ikke
    let again = run_directory(&config_path, None).unwrap();
    assert_eq!(again.report().unwrap().series.len(), 2);
}

#[test]
fn run_directory_without_data_dir_is_an_error() {
    let root = tempdir().unwrap();
    let config_path = root.path().join("trainload.json");
    fs::write(&config_path, "{}").unwrap();
    let err = run_directory(&config_path, None).unwrap_err();
    assert!(err.to_string().contains("data_dir"), "{err}");
}

/// Teller hvor mange ganger historikken leses.
struct CountingStore {
    inner: MemoryHistoryStore,
    loads: Cell<usize>,
}

impl HistoryStore for CountingStore {
    fn load(&self) -> Result<WorkoutSeries, StoreError> {
        self.loads.set(self.loads.get() + 1);
        self.inner.load()
    }

    fn append(&mut self, records: Vec<WorkoutRecord>) -> Result<(WorkoutSeries, usize), StoreError> {
        // samme mønster som CSV-lageret: én lesing per append
        self.load()?;
        self.inner.append(records)
    }
}

#[test]
fn each_run_reads_history_once() {
    let store = CountingStore { inner: MemoryHistoryStore::new(DedupPolicy::DateDuration), loads: Cell::new(0) };
    let mut pipeline = Pipeline::new(PipelineConfig::default(), store).unwrap();

    pipeline.run(&sample_payloads(), None).unwrap();
    assert_eq!(pipeline.store().loads.get(), 1);

    pipeline.run(&sample_payloads(), None).unwrap();
    assert_eq!(pipeline.store().loads.get(), 2);
    assert_eq!(pipeline.metrics().duplicates_dropped_total.get(), 2);
}
