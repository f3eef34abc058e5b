pub mod config;
pub mod dates;
pub mod duration;
pub mod error;
pub mod extract;
pub mod json_api;
pub mod manual;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod risk;
pub mod schema;
pub mod series;
pub mod storage;
pub mod telemetry;
pub mod types;

#[cfg(feature = "python")]
mod py;

pub use config::{load_config, parse_config, PipelineConfig};
pub use error::{ConfigError, DurationError, ExtractError, PipelineError, StoreError};
pub use extract::{extract_batch, extract_record, ExtractionFailure, ExtractionReport, ExtractionWarning};
pub use metrics::{aggregate, efficiency, training_load, Aggregate, AggregateReport, LoadWindows};
pub use pipeline::{read_payload_dir, run_directory, Pipeline, PipelineOutcome, PipelineState};
pub use risk::RiskBand;
pub use schema::SchemaVariant;
pub use series::{DedupPolicy, WorkoutSeries};
pub use storage::{CsvHistoryStore, HistoryStore, MemoryHistoryStore};
pub use types::{DashboardRow, DateRange, RawPayload, RoundTo, WorkoutRecord};
