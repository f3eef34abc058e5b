use thiserror::Error;

/// Grunnen til at én payload ikke ble til en WorkoutRecord.
/// `Clone` fordi feilene lagres i rapporter som vises i dashboardet.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("no date field found (probed: {probed})")]
    MissingDate { probed: String },
    #[error("unparseable date '{value}'")]
    UnparseableDate { value: String },
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("invalid manual row: {0}")]
    InvalidRow(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DurationError {
    /// ISO-8601 varianter utenom `PT<sek>S` (timer, minutter, dager) havner her.
    #[error("unsupported duration encoding '{0}'")]
    Unsupported(String),
    #[error("negative duration {0}")]
    Negative(f64),
    #[error("non-finite duration")]
    NotFinite,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("history io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("history csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("unsupported load windows {short_days}/{long_days} (expected 3/7 or 3/28)")]
    UnsupportedWindows { short_days: u32, long_days: u32 },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] prometheus::Error),
}
