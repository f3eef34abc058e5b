use std::fmt::Write;

use crate::extract::{ExtractionFailure, ExtractionWarning};
use crate::pipeline::{PipelineOutcome, PipelineReport, PipelineState};

fn opt(v: Option<f64>, dp: usize) -> String {
    match v {
        Some(x) => format!("{x:.dp$}"),
        None => "-".to_string(),
    }
}

/// Liste over forkastede payloads og advarsler, én linje hver.
pub fn format_diagnostics(failures: &[ExtractionFailure], warnings: &[ExtractionWarning]) -> String {
    let mut out = String::new();
    for f in failures {
        let _ = writeln!(out, "dropped {}: {}", f.source, f.reason);
    }
    for w in warnings {
        let _ = writeln!(out, "warning {} [{}]: {}", w.source, w.field, w.message);
    }
    out
}

pub fn format_load_report(report: &PipelineReport) -> String {
    let mut out = String::new();
    let agg = &report.aggregate;
    let _ = writeln!(out, "--- Training Load Report ---");
    let _ = writeln!(
        out,
        "Sessions: {} shown / {} stored",
        report.rows.len(),
        report.series.len()
    );
    let total_km: f64 = report.rows.iter().map(|r| r.distance_km).sum();
    let total_h: f64 = report.rows.iter().map(|r| r.duration_hours).sum();
    let _ = writeln!(out, "Distance: {total_km:.2} km, duration: {total_h:.2} h");

    if let Some(day) = agg.latest() {
        let band = day.band.map_or("-", |b| b.label());
        let _ = writeln!(
            out,
            "Latest {}: load {:.1}, short {:.1}, long {:.1} ({}d), ACWR {} ({band})",
            day.date,
            day.load,
            day.short_term_load,
            day.long_term_load,
            agg.windows.long_days(),
            opt(day.acwr, 2),
        );
    }
    for w in &agg.weekly {
        let _ = writeln!(
            out,
            "Week of {}: {} session(s), {:.2} km, load {:.1}",
            w.week_start, w.sessions, w.distance_km, w.load
        );
    }
    out
}

pub fn format_outcome(outcome: &PipelineOutcome) -> String {
    let mut out = match &outcome.state {
        PipelineState::NoData => "No valid data loaded.\n".to_string(),
        PipelineState::Ready(r) => format_load_report(r),
    };
    out.push_str(&format_diagnostics(&outcome.failures, &outcome.warnings));
    out
}

pub fn print_load_report(outcome: &PipelineOutcome) {
    print!("{}", format_outcome(outcome));
}
