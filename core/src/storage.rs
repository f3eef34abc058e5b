use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::StoreError;
use crate::series::{DedupPolicy, WorkoutSeries};
use crate::types::WorkoutRecord;

/// Historikk-lager: les alt, legg til, dedupliser, skriv alt.
pub trait HistoryStore {
    fn load(&self) -> Result<WorkoutSeries, StoreError>;
    /// Returnerer hele historikken etter sammenslåing + antall droppede duplikater.
    fn append(&mut self, records: Vec<WorkoutRecord>) -> Result<(WorkoutSeries, usize), StoreError>;
}

/// CSV-fil på disk, nøkkel (dato, varighet) som standard.
#[derive(Debug, Clone)]
pub struct CsvHistoryStore {
    path: PathBuf,
    policy: DedupPolicy,
}

impl CsvHistoryStore {
    pub fn new(path: impl Into<PathBuf>, policy: DedupPolicy) -> Self {
        Self { path: path.into(), policy }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Leser historikk fra CSV. Finnes ikke filen, returneres en tom serie.
pub fn load_history(path: &Path, policy: DedupPolicy) -> Result<WorkoutSeries, StoreError> {
    if !path.exists() {
        warn!("History not found at {}, starting empty", path.display());
        return Ok(WorkoutSeries::default());
    }
    let mut rdr = csv::Reader::from_path(path)?;
    let records = rdr
        .deserialize::<WorkoutRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    let series = WorkoutSeries::from_records(records, policy);
    info!("History loaded from {} ({} rows)", path.display(), series.len());
    Ok(series)
}

/// Skriver hele serien til en søsterfil og bytter den inn.
pub fn save_history(series: &WorkoutSeries, path: &Path) -> Result<(), StoreError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("csv.tmp");
    {
        let mut wtr = csv::Writer::from_path(&tmp)?;
        for r in series.records() {
            wtr.serialize(r)?;
        }
        wtr.flush()?;
    }
    fs::rename(&tmp, path)?;
    info!("History saved to {} ({} rows)", path.display(), series.len());
    Ok(())
}

impl HistoryStore for CsvHistoryStore {
    fn load(&self) -> Result<WorkoutSeries, StoreError> {
        load_history(&self.path, self.policy)
    }

    fn append(&mut self, records: Vec<WorkoutRecord>) -> Result<(WorkoutSeries, usize), StoreError> {
        let existing = self.load()?;
        let (merged, dropped) = existing.merge(records, self.policy);
        if dropped > 0 {
            info!("Skipped {dropped} already stored session(s)");
        }
        save_history(&merged, &self.path)?;
        Ok((merged, dropped))
    }
}

/// Lager i minnet (tester og dashboards uten fil).
#[derive(Debug, Clone, Default)]
pub struct MemoryHistoryStore {
    series: WorkoutSeries,
    policy: DedupPolicy,
}

impl MemoryHistoryStore {
    pub fn new(policy: DedupPolicy) -> Self {
        Self { series: WorkoutSeries::default(), policy }
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn load(&self) -> Result<WorkoutSeries, StoreError> {
        Ok(self.series.clone())
    }

    fn append(&mut self, records: Vec<WorkoutRecord>) -> Result<(WorkoutSeries, usize), StoreError> {
        let (merged, dropped) = self.series.merge(records, self.policy);
        self.series = merged.clone();
        Ok((merged, dropped))
    }
}
