use std::io::Read;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::dates::parse_date_str;
use crate::error::ExtractError;
use crate::extract::{ExtractionFailure, ExtractionReport, ExtractionWarning};
use crate::types::WorkoutRecord;

/// Én håndskrevet rad: dato, distanse, snittpuls, kalorier (+ valgfri varighet i timer).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualRow {
    pub date: String,
    #[serde(default)]
    pub distance_km: Option<f64>,
    #[serde(default)]
    pub avg_heart_rate: Option<f64>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub duration_hours: Option<f64>,
}

impl ManualRow {
    pub fn new(date: &str, distance_km: f64, avg_heart_rate: f64, calories: f64) -> Self {
        Self {
            date: date.to_string(),
            distance_km: Some(distance_km),
            avg_heart_rate: Some(avg_heart_rate),
            calories: Some(calories),
            duration_hours: None,
        }
    }

    pub fn with_duration_hours(mut self, hours: f64) -> Self {
        self.duration_hours = Some(hours);
        self
    }
}

fn row_to_record(
    row: &ManualRow,
    source: &str,
    warnings: &mut Vec<ExtractionWarning>,
) -> Result<WorkoutRecord, ExtractError> {
    if row.date.trim().is_empty() {
        return Err(ExtractError::MissingDate { probed: "date".into() });
    }
    let date = parse_date_str(&row.date)
        .ok_or_else(|| ExtractError::UnparseableDate { value: row.date.clone() })?;

    let mut check = |field: &'static str, v: Option<f64>| -> Option<f64> {
        match v {
            Some(x) if x.is_finite() && x >= 0.0 => Some(x),
            Some(x) => {
                warnings.push(ExtractionWarning {
                    source: source.to_string(),
                    field,
                    message: format!("invalid value {x}"),
                });
                None
            }
            None => None,
        }
    };

    let distance_km = check("distance_km", row.distance_km).unwrap_or(0.0);
    let duration_hours = check("duration_hours", row.duration_hours).unwrap_or(0.0);
    let calories = check("calories", row.calories);
    let avg_hr = check("avg_heart_rate", row.avg_heart_rate)
        .filter(|hr| *hr >= 1.0)
        .map(|hr| hr.round() as u32);

    Ok(WorkoutRecord::new(date)
        .with_distance_km(distance_km)
        .with_duration_hours(duration_hours)
        .with_avg_heart_rate(avg_hr)
        .with_calories(calories)
        .with_source(source))
}

/// Rader bygget i kode (tabell-literal).
pub fn from_rows(rows: &[ManualRow]) -> ExtractionReport {
    let mut report = ExtractionReport::default();
    for (i, row) in rows.iter().enumerate() {
        let source = format!("row {}", i + 1);
        match row_to_record(row, &source, &mut report.warnings) {
            Ok(r) => report.records.push(r),
            Err(reason) => {
                warn!("Dropping {source}: {reason}");
                report.failures.push(ExtractionFailure::new(source, reason));
            }
        }
    }
    report
}

/// CSV med header `date,distance_km,avg_heart_rate,calories[,duration_hours]`.
/// Kilde-id er linjenummeret i filen.
pub fn parse_manual_csv<R: Read>(input: R) -> ExtractionReport {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);
    let mut report = ExtractionReport::default();

    let headers = match rdr.headers() {
        Ok(h) => h.clone(),
        Err(e) => {
            report
                .failures
                .push(ExtractionFailure::new("line 1", ExtractError::InvalidRow(e.to_string())));
            return report;
        }
    };

    for result in rdr.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                report.failures.push(ExtractionFailure::new(
                    format!("line {line}"),
                    ExtractError::InvalidRow(e.to_string()),
                ));
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line());
        let source = format!("line {line}");
        let parsed = record
            .deserialize::<ManualRow>(Some(&headers))
            .map_err(|e| ExtractError::InvalidRow(e.to_string()))
            .and_then(|row| row_to_record(&row, &source, &mut report.warnings));
        match parsed {
            Ok(r) => report.records.push(r),
            Err(reason) => {
                warn!("Dropping {source}: {reason}");
                report.failures.push(ExtractionFailure::new(source, reason));
            }
        }
    }
    report
}
