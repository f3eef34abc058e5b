use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::types::{DateRange, WorkoutRecord};

/// Hvilken sammensatt nøkkel som identifiserer "samme økt".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    #[default]
    DateDuration,
    /// Faller tilbake til dato+varighet når posten mangler kilde.
    DateSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    DateDuration(NaiveDateTime, OrderedFloat<f64>),
    DateSource(NaiveDateTime, String),
}

impl DedupPolicy {
    pub fn key(self, r: &WorkoutRecord) -> DedupKey {
        match (self, &r.source) {
            (DedupPolicy::DateSource, Some(src)) => DedupKey::DateSource(r.date, src.clone()),
            _ => DedupKey::DateDuration(r.date, OrderedFloat(r.duration_hours)),
        }
    }
}

/// Sortert (stigende dato) og deduplisert rekke av økter. Skrivebeskyttet når bygget.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkoutSeries {
    records: Vec<WorkoutRecord>,
}

impl WorkoutSeries {
    /// Sorterer stabilt på dato og beholder første forekomst per nøkkel.
    pub fn from_records(records: Vec<WorkoutRecord>, policy: DedupPolicy) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let mut kept: Vec<WorkoutRecord> = records
            .into_iter()
            .filter(|r| seen.insert(policy.key(r)))
            .collect();
        kept.sort_by_key(|r| r.date);
        Self { records: kept }
    }

    /// Eksisterende rader beholdes uendret; nye legges til kun hvis nøkkelen er ny.
    /// Returnerer også antall droppede duplikater.
    pub fn merge(&self, new: Vec<WorkoutRecord>, policy: DedupPolicy) -> (Self, usize) {
        let mut seen: HashSet<DedupKey> = self.records.iter().map(|r| policy.key(r)).collect();
        let mut merged = self.records.clone();
        let mut dropped = 0usize;
        for r in new {
            if seen.insert(policy.key(&r)) {
                merged.push(r);
            } else {
                dropped += 1;
            }
        }
        merged.sort_by_key(|r| r.date);
        (Self { records: merged }, dropped)
    }

    pub fn between(&self, range: DateRange) -> Self {
        Self {
            records: self
                .records
                .iter()
                .filter(|r| range.contains(r.day()))
                .cloned()
                .collect(),
        }
    }

    pub fn records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<WorkoutRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        self.records.first().map(WorkoutRecord::day)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.records.last().map(WorkoutRecord::day)
    }

    /// Hele spennet serien dekker (for dato-velgeren).
    pub fn span(&self) -> Option<DateRange> {
        Some(DateRange::new(self.first_day()?, self.last_day()?))
    }
}
