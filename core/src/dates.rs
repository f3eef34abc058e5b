use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::error::ExtractError;

/// Prøves i rekkefølge. Første treff vinner.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Datoer uten klokkeslett. `%d-%m-%Y` er formatet i den håndskrevne tabellen.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d.%m.%Y"];

/// Minste verdi som tolkes som epoch-ms (1973-03-03). Mindre tall er ikke tidsstempler.
pub const MIN_EPOCH_MILLIS: i64 = 100_000_000_000;

/// Epoch-millisekunder → tidssonefri dato/tid (UTC-veggklokke).
pub fn from_epoch_millis(ms: i64) -> Option<NaiveDateTime> {
    if ms < MIN_EPOCH_MILLIS {
        return None;
    }
    DateTime::from_timestamp(ms.div_euclid(1000), 0).map(|dt| dt.naive_utc())
}

/// `YYYYMMDD` uten skilletegn.
fn parse_compact_date(s: &str) -> Option<NaiveDateTime> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let y = s[0..4].parse().ok()?;
    let m = s[4..6].parse().ok()?;
    let d = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)?.and_hms_opt(0, 0, 0)
}

pub fn parse_date_str(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    // Offset/Z: behold veggklokka slik eksporten skrev den
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    if let Some(dt) = parse_compact_date(s) {
        return Some(dt);
    }
    s.parse::<i64>().ok().and_then(from_epoch_millis)
}

/// Tall tolkes som epoch-ms (start-tidsfelt), strenger som tekstdatoer.
pub fn parse_date_value(value: &Value) -> Result<NaiveDateTime, ExtractError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|x| x.is_finite()).map(|x| x as i64))
            .and_then(from_epoch_millis),
        Value::String(s) => parse_date_str(s),
        _ => None,
    };
    parsed.ok_or_else(|| ExtractError::UnparseableDate {
        value: match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    })
}
