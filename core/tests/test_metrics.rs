use chrono::NaiveDate;

use trainload_core::metrics::{aggregate, daily_buckets, efficiency, training_load, Aggregate, LoadWindows};
use trainload_core::{DedupPolicy, RiskBand, RoundTo, WorkoutRecord, WorkoutSeries};

fn day(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, m, d).unwrap()
}

fn rec(m: u32, d: u32, km: f64, hours: f64, hr: Option<u32>, kcal: Option<f64>) -> WorkoutRecord {
    WorkoutRecord::on_day(day(m, d))
        .with_distance_km(km)
        .with_duration_hours(hours)
        .with_avg_heart_rate(hr)
        .with_calories(kcal)
}

fn series(records: Vec<WorkoutRecord>) -> WorkoutSeries {
    WorkoutSeries::from_records(records, DedupPolicy::DateDuration)
}

fn report(s: &WorkoutSeries, w: LoadWindows) -> trainload_core::AggregateReport {
    match aggregate(s, w) {
        Aggregate::Report(r) => r,
        Aggregate::NoData => panic!("expected data"),
    }
}

#[test]
fn end_to_end_two_sessions() {
    let s = series(vec![
        rec(7, 8, 18.79, 3.0, Some(112), Some(1686.0)),
        rec(7, 10, 7.18, 1.367, Some(112), Some(750.0)),
    ]);
    let speeds: Vec<f64> = s
        .records()
        .iter()
        .map(|r| r.avg_speed_kmh().unwrap().round_to(2))
        .collect();
    assert_eq!(speeds, vec![6.26, 5.25]);

    let r = report(&s, LoadWindows::MONTH);
    assert_eq!(r.days.len(), 3);
    assert!((r.days[0].load - 201.6).abs() < 1e-9);
    assert_eq!(r.days[1].load, 0.0);
    assert_eq!(r.days[1].sessions, 0);
    assert!((r.days[2].load - 1.367 * 60.0 * 1.12).abs() < 1e-9);
    // Få dager: kort og langt snitt bruker de samme dagene
    for d in &r.daily {
        assert!((d.acwr.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(d.band, Some(RiskBand::Optimal));
    }
}

#[test]
fn resampling_fills_missing_days_with_zero() {
    let s = series(vec![
        rec(7, 1, 10.0, 1.0, Some(120), None),
        rec(7, 5, 10.0, 1.0, Some(120), None),
    ]);
    let days = daily_buckets(&s);
    assert_eq!(days.len(), 5);
    let loads: Vec<f64> = days.iter().map(|d| d.load).collect();
    assert_eq!(loads, vec![72.0, 0.0, 0.0, 0.0, 72.0]);
    assert_eq!(days[2].date, day(7, 3));
}

#[test]
fn same_day_sessions_are_summed() {
    let s = series(vec![
        rec(7, 1, 5.0, 1.0, Some(100), None),
        rec(7, 1, 3.0, 0.5, Some(100), None),
    ]);
    let days = daily_buckets(&s);
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].load, 90.0);
    assert_eq!(days[0].sessions, 2);
    assert_eq!(days[0].distance_km, 8.0);
}

#[test]
fn acwr_rises_into_risk_bands_with_week_window() {
    let mut recs: Vec<WorkoutRecord> = (1..=7).map(|d| rec(7, d, 10.0, 1.0, Some(100), None)).collect();
    recs.extend((8..=10).map(|d| rec(7, d, 25.0, 3.0, Some(100), None)));
    let r = report(&series(recs), LoadWindows::WEEK);

    assert_eq!(r.daily.len(), 10);
    assert!((r.daily[6].acwr.unwrap() - 1.0).abs() < 1e-12);

    let d8 = &r.daily[7];
    assert!((d8.short_term_load - 100.0).abs() < 1e-9);
    assert!((d8.long_term_load - 540.0 / 7.0).abs() < 1e-9);
    assert_eq!(d8.band, Some(RiskBand::Optimal));

    assert_eq!(r.daily[8].band, Some(RiskBand::Caution));
    assert_eq!(r.daily[9].band, Some(RiskBand::HighRisk));
    assert_eq!(r.latest().unwrap().date, day(7, 10));
}

#[test]
fn long_window_changes_the_ratio() {
    let mut recs: Vec<WorkoutRecord> = (1..=28).map(|d| rec(6, d, 10.0, 1.0, Some(100), None)).collect();
    recs.extend((29..=30).map(|d| rec(6, d, 25.0, 3.0, Some(100), None)));
    let s = series(recs);
    let week = report(&s, LoadWindows::WEEK).latest().unwrap().acwr.unwrap();
    let month = report(&s, LoadWindows::MONTH).latest().unwrap().acwr.unwrap();
    assert!(week < month, "week {week} month {month}");
}

#[test]
fn unknown_heart_rate_gives_zero_load_and_no_efficiency() {
    let r = rec(7, 1, 10.0, 1.0, None, None);
    assert_eq!(training_load(&r), 0.0);
    assert_eq!(efficiency(&r), None);

    let with_hr = rec(7, 1, 18.79, 3.0, Some(112), None);
    let eff = efficiency(&with_hr).unwrap();
    assert!((eff - 18.79 / 3.0 / 112.0).abs() < 1e-12);

    // ingen varighet → ingen fart → ingen effektivitet
    assert_eq!(efficiency(&rec(7, 1, 10.0, 0.0, Some(120), None)), None);
}

#[test]
fn acwr_is_undefined_when_long_load_is_zero() {
    let s = series(vec![rec(7, 1, 10.0, 1.0, None, None), rec(7, 3, 5.0, 0.5, None, None)]);
    let r = report(&s, LoadWindows::MONTH);
    assert_eq!(r.daily.len(), 3);
    assert!(r.daily.iter().all(|d| d.acwr.is_none() && d.band.is_none()));
}

#[test]
fn weekly_totals_follow_iso_weeks() {
    let s = series(vec![
        rec(7, 8, 18.79, 3.0, Some(112), None),
        rec(7, 10, 7.18, 1.367, Some(112), None),
        rec(7, 14, 8.41, 1.0, Some(118), None),
    ]);
    let r = report(&s, LoadWindows::WEEK);
    assert_eq!(r.weekly.len(), 2);
    assert_eq!(r.weekly[0].week_start, day(7, 7));
    assert_eq!(r.weekly[0].sessions, 2);
    assert!((r.weekly[0].distance_km - 25.97).abs() < 1e-9);
    assert_eq!(r.weekly[1].week_start, day(7, 14));
    assert_eq!(r.weekly[1].sessions, 1);
}

#[test]
fn empty_series_is_no_data() {
    assert_eq!(aggregate(&WorkoutSeries::default(), LoadWindows::WEEK), Aggregate::NoData);
}

#[test]
fn dashboard_rows_carry_day_acwr() {
    let s = series(vec![
        rec(7, 8, 18.79, 3.0, Some(112), Some(1686.0)),
        rec(7, 10, 7.18, 1.367, None, Some(750.0)),
    ]);
    let r = report(&s, LoadWindows::WEEK);
    let rows = r.dashboard_rows(&s, None);
    assert_eq!(rows.len(), 2);
    assert!((rows[0].training_load - 201.6).abs() < 1e-9);
    assert_eq!(rows[0].acwr, Some(1.0));
    assert_eq!(rows[1].avg_heart_rate, None);
    assert_eq!(rows[1].training_load, 0.0);
    // dag 3: kort = langt = 201.6/3
    assert!((rows[1].acwr.unwrap() - 1.0).abs() < 1e-12);
}
