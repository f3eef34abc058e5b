use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;

use crate::dates::parse_date_value;
use crate::duration::duration_hours;
use crate::error::ExtractError;
use crate::schema::{resolve, SchemaVariant};
use crate::types::{RawPayload, WorkoutRecord};

/// Forkastet payload: kilde-id + grunn.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionFailure {
    pub source: String,
    pub reason: ExtractError,
}

impl ExtractionFailure {
    pub fn new(source: impl Into<String>, reason: ExtractError) -> Self {
        Self { source: source.into(), reason }
    }
}

/// Ikke-fatal avvik: posten beholdes, feltet faller tilbake til default/ukjent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionWarning {
    pub source: String,
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Extracted {
    pub record: WorkoutRecord,
    pub variant: SchemaVariant,
    pub warnings: Vec<ExtractionWarning>,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub records: Vec<WorkoutRecord>,
    pub failures: Vec<ExtractionFailure>,
    pub warnings: Vec<ExtractionWarning>,
}

impl ExtractionReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Slår sammen to rapporter (f.eks. katalog-feil + ekstraksjon).
    pub fn absorb(&mut self, other: ExtractionReport) {
        self.records.extend(other.records);
        self.failures.extend(other.failures);
        self.warnings.extend(other.warnings);
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// Tallhjelpere (tolerante: tall eller tallstreng)
// ──────────────────────────────────────────────────────────────────────────────

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|x| x.is_finite())
}

fn as_bpm(v: &Value) -> Option<Option<u32>> {
    let x = as_number(v)?;
    if x >= 1.0 && x <= u32::MAX as f64 {
        Some(Some(x.round() as u32))
    } else {
        // 0 / negativ = "ingen måling"
        Some(None)
    }
}

struct Ctx<'a> {
    source: &'a str,
    warnings: Vec<ExtractionWarning>,
}

impl Ctx<'_> {
    fn warn(&mut self, field: &'static str, message: String) {
        self.warnings.push(ExtractionWarning {
            source: self.source.to_string(),
            field,
            message,
        });
    }

    fn heart_rate(&mut self, payload: &Value, paths: &[&'static str], field: &'static str) -> Option<u32> {
        let (path, v) = resolve(payload, paths)?;
        match as_bpm(v) {
            Some(bpm) => bpm,
            None => {
                self.warn(field, format!("'{path}' is not numeric: {v}"));
                None
            }
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// EKSTRAKSJON
// ──────────────────────────────────────────────────────────────────────────────

/// Én payload → én post, eller en feil med kilde-id.
/// `hint` overstyrer auto-deteksjonen.
pub fn extract_record(
    payload: &RawPayload,
    hint: Option<SchemaVariant>,
) -> Result<Extracted, ExtractionFailure> {
    let source = payload.source.as_str();
    let value = &payload.value;
    if !value.is_object() {
        return Err(ExtractionFailure::new(source, ExtractError::NotAnObject));
    }

    let variant = hint.unwrap_or_else(|| SchemaVariant::detect(value));
    let keys = variant.keys();
    debug!("{source}: schema variant {}", variant.as_str());

    // Dato først: uten dato ingen post
    let (_, raw_date) = resolve(value, keys.date).ok_or_else(|| {
        ExtractionFailure::new(
            source,
            ExtractError::MissingDate { probed: keys.date.join(", ") },
        )
    })?;
    let date = parse_date_value(raw_date).map_err(|e| ExtractionFailure::new(source, e))?;

    let mut ctx = Ctx { source, warnings: Vec::new() };

    let duration_h = match resolve(value, keys.duration) {
        Some((path, v)) => match duration_hours(v) {
            Ok(h) => h,
            Err(e) => {
                ctx.warn("duration_hours", format!("'{path}': {e}; using 0 h"));
                0.0
            }
        },
        None => 0.0,
    };

    let distance_km = keys
        .distance
        .iter()
        .find_map(|(path, unit)| resolve(value, &[*path]).map(|(p, v)| (p, v, *unit)))
        .map(|(path, v, unit)| match as_number(v) {
            Some(x) if x >= 0.0 => unit.to_km(x),
            _ => {
                ctx.warn("distance_km", format!("'{path}' is not a non-negative number: {v}; using 0 km"));
                0.0
            }
        })
        .unwrap_or(0.0);

    let avg_hr = ctx.heart_rate(value, keys.avg_heart_rate, "avg_heart_rate");
    let max_hr = ctx.heart_rate(value, keys.max_heart_rate, "max_heart_rate");

    let calories = match resolve(value, keys.calories) {
        Some((path, v)) => match as_number(v) {
            Some(x) if x >= 0.0 => Some(x),
            _ => {
                ctx.warn("calories", format!("'{path}' is not a non-negative number: {v}"));
                None
            }
        },
        None => None,
    };

    let record = WorkoutRecord::new(date)
        .with_distance_km(distance_km)
        .with_duration_hours(duration_h)
        .with_avg_heart_rate(avg_hr)
        .with_max_heart_rate(max_hr)
        .with_calories(calories)
        .with_source(source);

    Ok(Extracted { record, variant, warnings: ctx.warnings })
}

/// Hele batchen: én dårlig payload stopper aldri resten.
pub fn extract_batch(payloads: &[RawPayload], hint: Option<SchemaVariant>) -> ExtractionReport {
    let mut report = ExtractionReport::default();
    for payload in payloads {
        match extract_record(payload, hint) {
            Ok(ex) => {
                for w in &ex.warnings {
                    warn!("{}: {} ({})", w.source, w.message, w.field);
                }
                report.warnings.extend(ex.warnings);
                report.records.push(ex.record);
            }
            Err(f) => {
                warn!("Dropping {}: {}", f.source, f.reason);
                report.failures.push(f);
            }
        }
    }
    report
}
