use std::fs;
use std::path::Path;

use anyhow::Context;
use log::{info, warn};
use serde_json::Value;

use crate::config::{load_config, PipelineConfig};
use crate::error::{ExtractError, PipelineError};
use crate::extract::{extract_batch, ExtractionFailure, ExtractionReport, ExtractionWarning};
use crate::metrics::{aggregate, Aggregate, AggregateReport};
use crate::series::WorkoutSeries;
use crate::storage::{CsvHistoryStore, HistoryStore, MemoryHistoryStore};
use crate::telemetry::PipelineMetrics;
use crate::types::{DashboardRow, DateRange, RawPayload, WorkoutRecord};

/// Payloads lest fra en katalog + filer som ikke kunne leses som JSON.
#[derive(Debug, Default)]
pub struct PayloadBatch {
    pub payloads: Vec<RawPayload>,
    pub failures: Vec<ExtractionFailure>,
}

/// Leser alle `*.json` i katalogen i filnavn-rekkefølge.
/// En fil med en liste gir én payload per element (`fil#i`).
pub fn read_payload_dir(dir: &Path) -> std::io::Result<PayloadBatch> {
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().map_or(false, |x| x.eq_ignore_ascii_case("json")))
        .collect();
    paths.sort();

    let mut batch = PayloadBatch::default();
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|txt| serde_json::from_str::<Value>(&txt).map_err(|e| e.to_string()));
        match parsed {
            Ok(Value::Array(items)) => {
                for (i, item) in items.into_iter().enumerate() {
                    batch.payloads.push(RawPayload::new(format!("{name}#{i}"), item));
                }
            }
            Ok(value) => batch.payloads.push(RawPayload::new(name, value)),
            Err(msg) => {
                warn!("Skipping {name}: {msg}");
                batch.failures.push(ExtractionFailure::new(name, ExtractError::InvalidJson(msg)));
            }
        }
    }
    info!("Read {} payload(s) from {}", batch.payloads.len(), dir.display());
    Ok(batch)
}

/// Alt dashboardet trenger for ett kjør.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub series: WorkoutSeries,
    pub aggregate: AggregateReport,
    pub rows: Vec<DashboardRow>,
    pub range: Option<DateRange>,
}

#[derive(Debug, Clone)]
pub enum PipelineState {
    /// Ingen gyldige økter (eller ingen i valgt intervall). Tegning hoppes over.
    NoData,
    Ready(PipelineReport),
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub state: PipelineState,
    pub failures: Vec<ExtractionFailure>,
    pub warnings: Vec<ExtractionWarning>,
}

impl PipelineOutcome {
    pub fn report(&self) -> Option<&PipelineReport> {
        match &self.state {
            PipelineState::Ready(r) => Some(r),
            PipelineState::NoData => None,
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self.state, PipelineState::NoData)
    }
}

/// Ekstraksjon → lager → aggregat. Lageret injiseres.
pub struct Pipeline<S: HistoryStore> {
    config: PipelineConfig,
    store: S,
    metrics: PipelineMetrics,
}

impl Pipeline<MemoryHistoryStore> {
    pub fn in_memory(config: PipelineConfig) -> Result<Self, PipelineError> {
        let store = MemoryHistoryStore::new(config.dedup);
        Pipeline::new(config, store)
    }
}

impl<S: HistoryStore> Pipeline<S> {
    pub fn new(config: PipelineConfig, store: S) -> Result<Self, PipelineError> {
        Ok(Self { config, store, metrics: PipelineMetrics::new()? })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn extract(&self, payloads: &[RawPayload]) -> ExtractionReport {
        let report = extract_batch(payloads, self.config.schema_hint);
        self.metrics.payloads_total.inc_by(payloads.len() as u64);
        self.metrics.records_extracted_total.inc_by(report.records.len() as u64);
        self.metrics.extraction_failures_total.inc_by(report.failures.len() as u64);
        self.metrics.extraction_warnings_total.inc_by(report.warnings.len() as u64);
        report
    }

    /// Legger nye poster i lageret og returnerer hele historikken.
    pub fn ingest(&mut self, records: Vec<WorkoutRecord>) -> Result<WorkoutSeries, PipelineError> {
        let (merged, dropped) = self.store.append(records)?;
        self.metrics.duplicates_dropped_total.inc_by(dropped as u64);
        Ok(merged)
    }

    /// Aggregerer over hele historikken; `range` styrer kun hva som vises.
    pub fn evaluate(&self, series: WorkoutSeries, range: Option<DateRange>) -> PipelineState {
        let aggregate = match aggregate(&series, self.config.windows) {
            Aggregate::Report(r) => r,
            Aggregate::NoData => {
                self.metrics.no_data_total.inc();
                return PipelineState::NoData;
            }
        };
        let rows = aggregate.dashboard_rows(&series, range);
        if rows.is_empty() {
            info!("No sessions in the selected range");
            self.metrics.no_data_total.inc();
            return PipelineState::NoData;
        }
        PipelineState::Ready(PipelineReport { series, aggregate, rows, range })
    }

    /// Ett fullt pass over en batch rå payloads.
    pub fn run(
        &mut self,
        payloads: &[RawPayload],
        range: Option<DateRange>,
    ) -> Result<PipelineOutcome, PipelineError> {
        let extraction = self.extract(payloads);
        self.finish(extraction, range)
    }

    /// Som `run`, men for poster som allerede er ekstrahert (manuell tabell, katalog).
    pub fn finish(
        &mut self,
        extraction: ExtractionReport,
        range: Option<DateRange>,
    ) -> Result<PipelineOutcome, PipelineError> {
        let ExtractionReport { records, failures, warnings } = extraction;
        let series = self.ingest(records)?;
        info!(
            "Pipeline: {} stored session(s), {} failure(s), {} warning(s)",
            series.len(),
            failures.len(),
            warnings.len()
        );
        Ok(PipelineOutcome { state: self.evaluate(series, range), failures, warnings })
    }
}

/// Konfig-fil → katalog → CSV-historikk → rapport.
pub fn run_directory(config_path: &Path, range: Option<DateRange>) -> anyhow::Result<PipelineOutcome> {
    let config = load_config(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    // Relative stier tolkes fra konfig-filens katalog
    let base = config_path.parent().unwrap_or_else(|| Path::new("."));
    let resolve = |p: &Path| if p.is_relative() { base.join(p) } else { p.to_path_buf() };

    let data_dir = config
        .data_dir
        .as_deref()
        .map(resolve)
        .context("config has no data_dir")?;
    let batch = read_payload_dir(&data_dir)
        .with_context(|| format!("reading payload dir {}", data_dir.display()))?;

    let history_path = config.history_path.as_deref().map(resolve);
    let outcome = match history_path {
        Some(path) => {
            let store = CsvHistoryStore::new(path, config.dedup);
            let mut pipeline = Pipeline::new(config, store)?;
            run_batch(&mut pipeline, batch, range)?
        }
        None => {
            let mut pipeline = Pipeline::in_memory(config)?;
            run_batch(&mut pipeline, batch, range)?
        }
    };
    Ok(outcome)
}

fn run_batch<S: HistoryStore>(
    pipeline: &mut Pipeline<S>,
    batch: PayloadBatch,
    range: Option<DateRange>,
) -> Result<PipelineOutcome, PipelineError> {
    let mut extraction = ExtractionReport { failures: batch.failures, ..Default::default() };
    pipeline
        .metrics()
        .extraction_failures_total
        .inc_by(extraction.failures.len() as u64);
    extraction.absorb(pipeline.extract(&batch.payloads));
    pipeline.finish(extraction, range)
}
