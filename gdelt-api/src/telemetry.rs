//! Tracing subscriber initialization.
//!
//! No OTLP/Prometheus: `tracing` + `tracing-subscriber` with an env filter
//! and a format chosen by `GDELT_LOG_FORMAT` (`text` default, `json`).

use tracing_subscriber::{EnvFilter, fmt};

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    /// `text` or `json`.
    pub log_format: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: std::env::var("GDELT_SERVICE_NAME")
                .unwrap_or_else(|_| "gdelt-api".to_string()),
            log_format: std::env::var("GDELT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
        }
    }
}

/// Initialize the global tracing subscriber. Call once at startup.
pub fn init_tracing(config: &TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gdelt_api=info,gdelt_cache=info,tower_http=info"));

    if config.log_format == "json" {
        fmt().with_env_filter(env_filter).json().init();
    } else {
        fmt().with_env_filter(env_filter).init();
    }

    tracing::info!(service_name = %config.service_name, log_format = %config.log_format, "telemetry initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_reads_service_name_and_format() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "gdelt-api");
        assert_eq!(config.log_format, "text");
    }
}
