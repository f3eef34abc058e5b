use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::AggregateReport;

/// Faste grenser (ikke konfigurerbare).
pub const LOW_LOAD_BELOW: f64 = 0.8;
pub const OPTIMAL_UP_TO: f64 = 1.3;
pub const CAUTION_UP_TO: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    /// ACWR < 0.8
    LowLoad,
    /// 0.8 – 1.3 (inkl.)
    Optimal,
    /// > 1.3 og ≤ 1.5
    Caution,
    /// > 1.5
    HighRisk,
}

impl RiskBand {
    /// `None` for NaN/uendelig, ellers alltid et bånd.
    pub fn classify(acwr: f64) -> Option<RiskBand> {
        if !acwr.is_finite() {
            return None;
        }
        Some(if acwr < LOW_LOAD_BELOW {
            RiskBand::LowLoad
        } else if acwr <= OPTIMAL_UP_TO {
            RiskBand::Optimal
        } else if acwr <= CAUTION_UP_TO {
            RiskBand::Caution
        } else {
            RiskBand::HighRisk
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskBand::LowLoad => "low load",
            RiskBand::Optimal => "optimal",
            RiskBand::Caution => "caution",
            RiskBand::HighRisk => "high risk",
        }
    }

    pub fn is_overload(self) -> bool {
        matches!(self, RiskBand::Caution | RiskBand::HighRisk)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Klassifikator-søm: modellen er ekstern, vi leverer bare feature-tabellen
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFeatures {
    pub date: NaiveDate,
    pub load: f64,
    pub short_term_load: f64,
    pub long_term_load: f64,
    pub acwr: f64,
}

pub trait RiskModel {
    /// Sannsynlighet for overbelastning.
    fn predict_probability(&self, features: &RiskFeatures) -> f64;
}

pub trait RiskTrainer {
    type Model: RiskModel;
    type Error: std::error::Error;

    fn train(&self, features: &[RiskFeatures], labels: &[bool]) -> Result<Self::Model, Self::Error>;
}

/// Én rad per dag med definert ACWR. Dager uten ACWR tas ikke med.
pub fn feature_table(report: &AggregateReport) -> Vec<RiskFeatures> {
    report
        .daily
        .iter()
        .filter_map(|d| {
            Some(RiskFeatures {
                date: d.date,
                load: d.load,
                short_term_load: d.short_term_load,
                long_term_load: d.long_term_load,
                acwr: d.acwr?,
            })
        })
        .collect()
}

/// Merkelapp per rad: caution/high risk = true.
pub fn label_overload(features: &[RiskFeatures]) -> Vec<bool> {
    features
        .iter()
        .map(|f| RiskBand::classify(f.acwr).map_or(false, RiskBand::is_overload))
        .collect()
}

/// Kjører modellen over tabellen; svar utenfor [0, 1] klemmes, NaN blir 0.
pub fn score_days<M: RiskModel + ?Sized>(model: &M, features: &[RiskFeatures]) -> Vec<(NaiveDate, f64)> {
    features
        .iter()
        .map(|f| {
            let p = model.predict_probability(f);
            let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
            (f.date, p)
        })
        .collect()
}
