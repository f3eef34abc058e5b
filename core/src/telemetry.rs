use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Tellere for én pipeline. Eget register per instans, ingen global tilstand.
#[derive(Clone)]
pub struct PipelineMetrics {
    registry: Registry,
    pub payloads_total: IntCounter,
    pub records_extracted_total: IntCounter,
    pub extraction_failures_total: IntCounter,
    pub extraction_warnings_total: IntCounter,
    pub duplicates_dropped_total: IntCounter,
    pub no_data_total: IntCounter,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, prometheus::Error> {
    let c = IntCounter::new(name, help)?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl PipelineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("trainload".into()), None)?;
        Ok(Self {
            payloads_total: counter(&registry, "payloads_total", "Raw payloads seen")?,
            records_extracted_total: counter(&registry, "records_extracted_total", "Payloads turned into workout records")?,
            extraction_failures_total: counter(&registry, "extraction_failures_total", "Payloads dropped during extraction")?,
            extraction_warnings_total: counter(&registry, "extraction_warnings_total", "Non-fatal field warnings")?,
            duplicates_dropped_total: counter(&registry, "duplicates_dropped_total", "Sessions skipped as already stored")?,
            no_data_total: counter(&registry, "no_data_total", "Runs that ended without data")?,
            registry,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus tekstformat.
    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        if TextEncoder::new().encode(&self.registry.gather(), &mut buf).is_err() {
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
