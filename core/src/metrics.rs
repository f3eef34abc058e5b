use chrono::{Datelike, Duration, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::risk::RiskBand;
use crate::series::WorkoutSeries;
use crate::types::{DashboardRow, DateRange, WorkoutRecord};

pub const SHORT_WINDOW_DAYS: u32 = 3;
pub const LONG_WINDOW_WEEK: u32 = 7;
pub const LONG_WINDOW_MONTH: u32 = 28;

// ──────────────────────────────────────────────────────────────────────────────
// VINDUER
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawWindows {
    short_days: u32,
    long_days: u32,
}

/// Kort/langt vindu i kalenderdager. Kun 3/7 og 3/28 er gyldige.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawWindows")]
pub struct LoadWindows {
    short_days: u32,
    long_days: u32,
}

impl LoadWindows {
    pub const WEEK: LoadWindows = LoadWindows { short_days: SHORT_WINDOW_DAYS, long_days: LONG_WINDOW_WEEK };
    pub const MONTH: LoadWindows = LoadWindows { short_days: SHORT_WINDOW_DAYS, long_days: LONG_WINDOW_MONTH };

    pub fn new(short_days: u32, long_days: u32) -> Result<Self, ConfigError> {
        match (short_days, long_days) {
            (SHORT_WINDOW_DAYS, LONG_WINDOW_WEEK) => Ok(Self::WEEK),
            (SHORT_WINDOW_DAYS, LONG_WINDOW_MONTH) => Ok(Self::MONTH),
            _ => Err(ConfigError::UnsupportedWindows { short_days, long_days }),
        }
    }

    pub fn short_days(&self) -> u32 {
        self.short_days
    }

    pub fn long_days(&self) -> u32 {
        self.long_days
    }
}

impl Default for LoadWindows {
    fn default() -> Self {
        Self::MONTH
    }
}

impl TryFrom<RawWindows> for LoadWindows {
    type Error = ConfigError;

    fn try_from(raw: RawWindows) -> Result<Self, Self::Error> {
        LoadWindows::new(raw.short_days, raw.long_days)
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// PER ØKT
// ──────────────────────────────────────────────────────────────────────────────

/// Load = minutter × (snittpuls / 100). 0 når puls mangler.
pub fn training_load(r: &WorkoutRecord) -> f64 {
    match r.avg_heart_rate {
        Some(hr) => r.duration_minutes() * (hr as f64 / 100.0),
        None => 0.0,
    }
}

/// Effektivitet = km/t per slag. `None` hvis fart eller puls mangler.
pub fn efficiency(r: &WorkoutRecord) -> Option<f64> {
    match (r.avg_speed_kmh(), r.avg_heart_rate) {
        (Some(v), Some(hr)) if hr > 0 => Some(v / hr as f64),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordMetrics {
    pub date: chrono::NaiveDateTime,
    pub avg_speed_kmh: Option<f64>,
    pub training_load: f64,
    pub efficiency: Option<f64>,
}

impl RecordMetrics {
    pub fn of(r: &WorkoutRecord) -> Self {
        Self {
            date: r.date,
            avg_speed_kmh: r.avg_speed_kmh(),
            training_load: training_load(r),
            efficiency: efficiency(r),
        }
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// RESAMPLING
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub load: f64,
    pub distance_km: f64,
    pub duration_hours: f64,
    pub sessions: usize,
}

impl DailyBucket {
    fn empty(date: NaiveDate) -> Self {
        Self { date, load: 0.0, distance_km: 0.0, duration_hours: 0.0, sessions: 0 }
    }
}

/// Én bøtte per kalenderdag fra første til siste økt, dager uten økt = 0.
pub fn daily_buckets(series: &WorkoutSeries) -> Vec<DailyBucket> {
    let (Some(first), Some(last)) = (series.first_day(), series.last_day()) else {
        return Vec::new();
    };
    let mut buckets: Vec<DailyBucket> = first
        .iter_days()
        .take_while(|d| *d <= last)
        .map(DailyBucket::empty)
        .collect();

    for r in series.records() {
        let idx = (r.day() - first).num_days() as usize;
        let b = &mut buckets[idx];
        b.load += training_load(r);
        b.distance_km += r.distance_km;
        b.duration_hours += r.duration_hours;
        b.sessions += 1;
    }
    buckets
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyBucket {
    /// Mandag i ISO-uka
    pub week_start: NaiveDate,
    pub load: f64,
    pub distance_km: f64,
    pub duration_hours: f64,
    pub sessions: usize,
}

pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// Summerer dagsbøttene per ISO-uke (mandag–søndag).
pub fn weekly_totals(daily: &[DailyBucket]) -> Vec<WeeklyBucket> {
    let mut weeks: Vec<WeeklyBucket> = Vec::new();
    for d in daily {
        let ws = week_start(d.date);
        match weeks.last_mut() {
            Some(w) if w.week_start == ws => {
                w.load += d.load;
                w.distance_km += d.distance_km;
                w.duration_hours += d.duration_hours;
                w.sessions += d.sessions;
            }
            _ => weeks.push(WeeklyBucket {
                week_start: ws,
                load: d.load,
                distance_km: d.distance_km,
                duration_hours: d.duration_hours,
                sessions: d.sessions,
            }),
        }
    }
    weeks
}

// ──────────────────────────────────────────────────────────────────────────────
// RULLERENDE SNITT + ACWR
// ──────────────────────────────────────────────────────────────────────────────

/// Bakoverskuende glidende snitt med "min periods = 1":
/// de første `win - 1` verdiene bruker alle dager så langt.
pub fn rolling_mean(xs: &[f64], win: usize) -> Vec<f64> {
    let win = win.max(1);
    (0..xs.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(win);
            let slice = &xs[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

/// ACWR = kort / langt, udefinert når langt snitt er 0.
pub fn acwr(short_term_load: f64, long_term_load: f64) -> Option<f64> {
    if long_term_load > 0.0 && short_term_load.is_finite() {
        Some(short_term_load / long_term_load)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyLoad {
    pub date: NaiveDate,
    pub load: f64,
    pub short_term_load: f64,
    pub long_term_load: f64,
    pub acwr: Option<f64>,
    pub band: Option<RiskBand>,
}

pub fn daily_loads(daily: &[DailyBucket], windows: LoadWindows) -> Vec<DailyLoad> {
    let loads: Vec<f64> = daily.iter().map(|d| d.load).collect();
    let short = rolling_mean(&loads, windows.short_days() as usize);
    let long = rolling_mean(&loads, windows.long_days() as usize);

    daily
        .iter()
        .zip(short.into_iter().zip(long))
        .map(|(d, (s, l))| {
            let ratio = acwr(s, l);
            DailyLoad {
                date: d.date,
                load: d.load,
                short_term_load: s,
                long_term_load: l,
                acwr: ratio,
                band: ratio.and_then(RiskBand::classify),
            }
        })
        .collect()
}

// ──────────────────────────────────────────────────────────────────────────────
// AGGREGAT
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    pub windows: LoadWindows,
    pub records: Vec<RecordMetrics>,
    pub daily: Vec<DailyLoad>,
    pub days: Vec<DailyBucket>,
    pub weekly: Vec<WeeklyBucket>,
}

/// "Ingen data" er en normal slutt-tilstand, ikke en feil.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    NoData,
    Report(AggregateReport),
}

impl Aggregate {
    pub fn report(&self) -> Option<&AggregateReport> {
        match self {
            Aggregate::NoData => None,
            Aggregate::Report(r) => Some(r),
        }
    }
}

pub fn aggregate(series: &WorkoutSeries, windows: LoadWindows) -> Aggregate {
    if series.is_empty() {
        return Aggregate::NoData;
    }
    let records: Vec<RecordMetrics> = series.records().iter().map(RecordMetrics::of).collect();
    let days = daily_buckets(series);
    let daily = daily_loads(&days, windows);
    let weekly = weekly_totals(&days);
    debug!(
        "aggregated {} records into {} days / {} weeks ({}/{} windows)",
        records.len(),
        days.len(),
        weekly.len(),
        windows.short_days(),
        windows.long_days()
    );
    Aggregate::Report(AggregateReport { windows, records, daily, days, weekly })
}

impl AggregateReport {
    pub fn on_day(&self, day: NaiveDate) -> Option<&DailyLoad> {
        let first = self.daily.first()?.date;
        let idx = (day - first).num_days();
        if idx < 0 {
            return None;
        }
        self.daily.get(idx as usize).filter(|d| d.date == day)
    }

    pub fn latest(&self) -> Option<&DailyLoad> {
        self.daily.last()
    }

    /// Kun dager innenfor intervallet (vinduene er allerede regnet på hele historikken).
    pub fn daily_in(&self, range: DateRange) -> Vec<&DailyLoad> {
        self.daily.iter().filter(|d| range.contains(d.date)).collect()
    }

    /// Radene chartlaget trenger, valgfritt filtrert på dato.
    pub fn dashboard_rows(&self, series: &WorkoutSeries, range: Option<DateRange>) -> Vec<DashboardRow> {
        series
            .records()
            .iter()
            .filter(|r| range.map_or(true, |rg| rg.contains(r.day())))
            .map(|r| DashboardRow {
                date: r.date,
                distance_km: r.distance_km,
                duration_hours: r.duration_hours,
                avg_heart_rate: r.avg_heart_rate,
                calories: r.calories,
                avg_speed_kmh: r.avg_speed_kmh(),
                training_load: training_load(r),
                acwr: self.on_day(r.day()).and_then(|d| d.acwr),
            })
            .collect()
    }
}
