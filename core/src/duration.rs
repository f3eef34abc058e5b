use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::DurationError;
use crate::types::RoundTo;

/// Kun `PT<sekunder>S`, brøkdeler tillatt. Timer/minutter/dager matcher ikke.
static PT_SECONDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PT(\d+(?:\.\d+)?)S$").expect("PT_SECONDS regex"));

pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// Parser `"PT4819.500S"` → 4819.5 sekunder.
pub fn parse_iso_seconds(s: &str) -> Result<f64, DurationError> {
    let caps = PT_SECONDS
        .captures(s.trim())
        .ok_or_else(|| DurationError::Unsupported(s.to_string()))?;
    caps[1]
        .parse::<f64>()
        .map_err(|_| DurationError::Unsupported(s.to_string()))
}

/// Varighet i sekunder fra et JSON-felt: tall, tallstreng eller `PT…S`.
pub fn duration_seconds(value: &Value) -> Result<f64, DurationError> {
    let secs = match value {
        Value::Number(n) => n.as_f64().ok_or(DurationError::NotFinite)?,
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(x) => x,
            Err(_) => parse_iso_seconds(s)?,
        },
        other => return Err(DurationError::Unsupported(other.to_string())),
    };
    if !secs.is_finite() {
        return Err(DurationError::NotFinite);
    }
    if secs < 0.0 {
        return Err(DurationError::Negative(secs));
    }
    Ok(secs)
}

/// Sekunder → timer, lagret med 2 desimaler.
#[inline]
pub fn seconds_to_hours(secs: f64) -> f64 {
    (secs / SECONDS_PER_HOUR).round_to(2)
}

pub fn duration_hours(value: &Value) -> Result<f64, DurationError> {
    duration_seconds(value).map(seconds_to_hours)
}
