use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::metrics::LoadWindows;
use crate::schema::SchemaVariant;
use crate::series::DedupPolicy;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub windows: LoadWindows,
    pub dedup: DedupPolicy,
    /// Tving én skjemavariant i stedet for auto-deteksjon.
    pub schema_hint: Option<SchemaVariant>,
    pub history_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

/// Parser konfig fra JSON med sti i feilmeldingen.
pub fn parse_config(json_str: &str) -> Result<PipelineConfig, ConfigError> {
    let mut de = serde_json::Deserializer::from_str(json_str);
    serde_path_to_error::deserialize(&mut de).map_err(|e| ConfigError::Parse {
        path: e.path().to_string(),
        message: e.inner().to_string(),
    })
}

/// Leser inn konfig fra disk (JSON).
/// Hvis filen ikke finnes, returneres default-konfig.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    if !path.exists() {
        warn!("Config not found at {}, using defaults", path.display());
        return Ok(PipelineConfig::default());
    }
    let contents = std::fs::read_to_string(path)?;
    let cfg = parse_config(&contents)?;
    info!(
        "Config loaded from {} (windows {}/{}, dedup {:?})",
        path.display(),
        cfg.windows.short_days(),
        cfg.windows.long_days(),
        cfg.dedup
    );
    Ok(cfg)
}
