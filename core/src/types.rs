use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- RoundTo trait (offentlig, brukt av duration- og rapportkoden) ---
pub trait RoundTo {
    fn round_to(self, dp: u32) -> f64;
}

impl RoundTo for f64 {
    #[inline]
    fn round_to(self, dp: u32) -> f64 {
        if dp == 0 { return self.round(); }
        let factor = 10_f64.powi(dp as i32);
        (self * factor).round() / factor
    }
}

/// Én rå eksport-enhet (ett JSON-objekt) med kilde-id (filnavn, `fil#i`, radnummer).
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub source: String,
    pub value: Value,
}

impl RawPayload {
    pub fn new(source: impl Into<String>, value: Value) -> Self {
        Self { source: source.into(), value }
    }
}

/// Normalisert økt. Kun `date` er påkrevd; ukjent er `None`, aldri 0.
/// Deserialisering går gjennom byggerne, så historikkfiler og JSON-input
/// får de samme reglene som ekstraksjonen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRecord")]
pub struct WorkoutRecord {
    pub date: NaiveDateTime,
    pub distance_km: f64,
    pub duration_hours: f64,
    pub avg_heart_rate: Option<u32>,
    pub max_heart_rate: Option<u32>,
    pub calories: Option<f64>,
    pub source: Option<String>,
}

impl WorkoutRecord {
    pub fn new(date: NaiveDateTime) -> Self {
        Self {
            date,
            distance_km: 0.0,
            duration_hours: 0.0,
            avg_heart_rate: None,
            max_heart_rate: None,
            calories: None,
            source: None,
        }
    }

    /// Dato uten klokkeslett (kl. 00:00).
    pub fn on_day(day: NaiveDate) -> Self {
        Self::new(day.and_hms_opt(0, 0, 0).unwrap_or_default())
    }

    pub fn with_distance_km(mut self, km: f64) -> Self {
        self.distance_km = non_negative_or_zero(km);
        self
    }

    pub fn with_duration_hours(mut self, hours: f64) -> Self {
        self.duration_hours = non_negative_or_zero(hours);
        self
    }

    /// 0 bpm betyr "mangler" i eksportene, ikke en ekte puls.
    pub fn with_avg_heart_rate(mut self, bpm: Option<u32>) -> Self {
        self.avg_heart_rate = bpm.filter(|b| *b > 0);
        self
    }

    pub fn with_max_heart_rate(mut self, bpm: Option<u32>) -> Self {
        self.max_heart_rate = bpm.filter(|b| *b > 0);
        self
    }

    pub fn with_calories(mut self, kcal: Option<f64>) -> Self {
        self.calories = kcal.filter(|c| c.is_finite() && *c >= 0.0);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_hours * 60.0
    }

    /// km/t, `None` når varigheten er 0 (ikke det samme som fart 0).
    pub fn avg_speed_kmh(&self) -> Option<f64> {
        if self.duration_hours > 0.0 {
            Some(self.distance_km / self.duration_hours)
        } else {
            None
        }
    }
}

fn non_negative_or_zero(x: f64) -> f64 {
    if x.is_finite() && x > 0.0 { x } else { 0.0 }
}

/// Puls fra fri input: < 1 eller ikke-endelig = ukjent.
fn bpm(x: Option<f64>) -> Option<u32> {
    x.filter(|v| v.is_finite() && *v >= 1.0 && *v <= u32::MAX as f64)
        .map(|v| v.round() as u32)
}

/// Ubehandlet form av en lagret/innsendt post.
#[derive(Debug, Deserialize)]
struct RawRecord {
    date: NaiveDateTime,
    #[serde(default)]
    distance_km: f64,
    #[serde(default)]
    duration_hours: f64,
    #[serde(default)]
    avg_heart_rate: Option<f64>,
    #[serde(default)]
    max_heart_rate: Option<f64>,
    #[serde(default)]
    calories: Option<f64>,
    #[serde(default)]
    source: Option<String>,
}

impl From<RawRecord> for WorkoutRecord {
    fn from(raw: RawRecord) -> Self {
        let record = WorkoutRecord::new(raw.date)
            .with_distance_km(raw.distance_km)
            .with_duration_hours(raw.duration_hours)
            .with_avg_heart_rate(bpm(raw.avg_heart_rate))
            .with_max_heart_rate(bpm(raw.max_heart_rate))
            .with_calories(raw.calories);
        match raw.source {
            Some(src) => record.with_source(src),
            None => record,
        }
    }
}

/// Inklusivt datointervall (sidepanel-filteret i dashboardet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Bytter om start/slutt hvis de kommer i feil rekkefølge.
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Raden chartlaget leser. Feltnavnene er kontrakten mot dashboardet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub date: NaiveDateTime,
    pub distance_km: f64,
    pub duration_hours: f64,
    pub avg_heart_rate: Option<u32>,
    pub calories: Option<f64>,
    pub avg_speed_kmh: Option<f64>,
    pub training_load: f64,
    pub acwr: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn zero_duration_has_no_speed() {
        let r = WorkoutRecord::on_day(day(2025, 7, 8)).with_distance_km(5.0);
        assert_eq!(r.avg_speed_kmh(), None);
    }

    #[test]
    fn builder_keeps_unknown_as_none() {
        let r = WorkoutRecord::on_day(day(2025, 7, 8))
            .with_avg_heart_rate(Some(0))
            .with_calories(Some(-3.0))
            .with_distance_km(-1.0);
        assert_eq!(r.avg_heart_rate, None);
        assert_eq!(r.calories, None);
        assert_eq!(r.distance_km, 0.0);
    }

    #[test]
    fn date_range_is_inclusive_and_ordered() {
        let r = DateRange::new(day(2025, 7, 10), day(2025, 7, 8));
        assert_eq!(r.start, day(2025, 7, 8));
        assert!(r.contains(day(2025, 7, 10)));
        assert!(!r.contains(day(2025, 7, 11)));
    }

    #[test]
    fn deserialized_records_are_sanitized() {
        let r: WorkoutRecord = serde_json::from_str(
            r#"{"date":"2025-07-08T00:00:00","distance_km":-5,"duration_hours":-1,
                "avg_heart_rate":0,"max_heart_rate":141.4,"calories":-10}"#,
        )
        .unwrap();
        assert_eq!(r.distance_km, 0.0);
        assert_eq!(r.duration_hours, 0.0);
        assert_eq!(r.avg_heart_rate, None);
        assert_eq!(r.max_heart_rate, Some(141));
        assert_eq!(r.calories, None);
        assert_eq!(r.source, None);
    }

    #[test]
    fn round_to_two_decimals() {
        assert_eq!((4819.5f64 / 3600.0).round_to(2), 1.34);
    }
}
