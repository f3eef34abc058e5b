//! JSON-inngang for vertsdashboardet (brukes av Python-bindingen).
//! Alle feil returneres som `String` med JSON-sti.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use serde_path_to_error as spte;

use crate::config::PipelineConfig;
use crate::extract::{extract_batch, ExtractionFailure, ExtractionReport};
use crate::pipeline::{Pipeline, PipelineState};
use crate::report::format_outcome;
use crate::schema::SchemaVariant;
use crate::types::{DateRange, RawPayload, WorkoutRecord};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PayloadIn {
    Tagged { source: String, payload: Value },
    Bare(Value),
}

#[derive(Debug, Serialize)]
struct RecordOut<'a> {
    #[serde(flatten)]
    record: &'a WorkoutRecord,
    avg_speed_kmh: Option<f64>,
}

#[derive(Debug, Serialize)]
struct FailureOut<'a> {
    source: &'a str,
    reason: String,
}

impl<'a> From<&'a ExtractionFailure> for FailureOut<'a> {
    fn from(f: &'a ExtractionFailure) -> Self {
        Self { source: &f.source, reason: f.reason.to_string() }
    }
}

fn parse<T: for<'de> Deserialize<'de>>(json_in: &str, what: &str) -> Result<T, String> {
    let mut de = serde_json::Deserializer::from_str(json_in);
    spte::deserialize(&mut de).map_err(|e| format!("parse error ({what}) at {}: {}", e.path(), e.inner()))
}

fn parse_hint(hint: Option<&str>) -> Result<Option<SchemaVariant>, String> {
    hint.map(|h| {
        serde_json::from_value::<SchemaVariant>(Value::String(h.to_string()))
            .map_err(|_| format!("unknown schema variant '{h}'"))
    })
    .transpose()
}

/// `[{"source": "...", "payload": {...}} | {...}]` → `{records, failures, warnings}`.
pub fn extract_batch_json(json_in: &str, hint: Option<&str>) -> Result<String, String> {
    let items: Vec<PayloadIn> = parse(json_in, "payload list")?;
    let hint = parse_hint(hint)?;
    let payloads: Vec<RawPayload> = items
        .into_iter()
        .enumerate()
        .map(|(i, p)| match p {
            PayloadIn::Tagged { source, payload } => RawPayload::new(source, payload),
            PayloadIn::Bare(value) => RawPayload::new(format!("payload #{i}"), value),
        })
        .collect();

    let report = extract_batch(&payloads, hint);
    let out = json!({
        "records": report
            .records
            .iter()
            .map(|r| RecordOut { record: r, avg_speed_kmh: r.avg_speed_kmh() })
            .collect::<Vec<_>>(),
        "failures": report.failures.iter().map(FailureOut::from).collect::<Vec<_>>(),
        "warnings": report.warnings,
    });
    Ok(out.to_string())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AggregateIn {
    records: Vec<WorkoutRecord>,
    #[serde(default)]
    config: PipelineConfig,
    #[serde(default)]
    range: Option<DateRange>,
}

/// `{records, config?, range?}` → dashboard-tabell, eller `{"status": "no_data"}`.
pub fn aggregate_json(json_in: &str) -> Result<String, String> {
    let input: AggregateIn = parse(json_in, "aggregate input")?;
    let mut pipeline = Pipeline::in_memory(input.config).map_err(|e| e.to_string())?;
    let extraction = ExtractionReport { records: input.records, ..Default::default() };
    let range = input.range.map(|r| DateRange::new(r.start, r.end));
    let outcome = pipeline.finish(extraction, range).map_err(|e| e.to_string())?;

    let out = match &outcome.state {
        PipelineState::NoData => json!({ "status": "no_data" }),
        PipelineState::Ready(r) => json!({
            "status": "ok",
            "windows": r.aggregate.windows,
            "rows": r.rows,
            "records": r.aggregate.records,
            "daily": r.aggregate.daily,
            "days": r.aggregate.days,
            "weekly": r.aggregate.weekly,
            "summary": format_outcome(&outcome),
        }),
    };
    Ok(out.to_string())
}
