//! Tracer configuration.
//!
//! Read once at startup and handed verbatim to the backend adapter; the
//! bridge applies no logic beyond defaulting. Environment variables:
//!
//! - `FLOWTRACE_ENDPOINT` - collector endpoint URL
//! - `FLOWTRACE_SERVICE_NAME` - service name reported on every span
//! - `FLOWTRACE_SAMPLE_RATIO` - fixed-rate sampling ratio (0.0 - 1.0)
//! - `FLOWTRACE_LOG_SPANS` - log each finished span
//! - `FLOWTRACE_FLUSH_INTERVAL_MS` - export flush interval

use serde::{Deserialize, Serialize};

/// Configuration passed through to the tracing backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracerConfig {
    /// Collector endpoint URL.
    pub endpoint: String,

    /// Service name reported on every span.
    pub service_name: String,

    /// Fixed-rate sampling ratio in `[0.0, 1.0]`; `1.0` samples everything.
    pub sample_ratio: f64,

    /// Whether the backend should log each finished span.
    pub log_spans: bool,

    /// Export flush interval in milliseconds.
    pub flush_interval_ms: u64,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4317".to_string(),
            service_name: "flowtrace".to_string(),
            sample_ratio: 1.0,
            log_spans: true,
            flush_interval_ms: 200,
        }
    }
}

impl TracerConfig {
    /// Create a new config builder.
    pub fn builder() -> TracerConfigBuilder {
        TracerConfigBuilder::new()
    }

    /// Create config from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: std::env::var("FLOWTRACE_ENDPOINT").unwrap_or(defaults.endpoint),
            service_name: std::env::var("FLOWTRACE_SERVICE_NAME").unwrap_or(defaults.service_name),
            sample_ratio: std::env::var("FLOWTRACE_SAMPLE_RATIO")
                .map(|v| v.parse().unwrap_or(defaults.sample_ratio))
                .unwrap_or(defaults.sample_ratio),
            log_spans: std::env::var("FLOWTRACE_LOG_SPANS")
                .map(|v| v.parse().unwrap_or(defaults.log_spans))
                .unwrap_or(defaults.log_spans),
            flush_interval_ms: std::env::var("FLOWTRACE_FLUSH_INTERVAL_MS")
                .map(|v| v.parse().unwrap_or(defaults.flush_interval_ms))
                .unwrap_or(defaults.flush_interval_ms),
        }
    }
}

/// Builder for [`TracerConfig`].
pub struct TracerConfigBuilder {
    config: TracerConfig,
}

impl TracerConfigBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            config: TracerConfig::default(),
        }
    }

    /// Set the collector endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    /// Set the service name.
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.config.service_name = name.into();
        self
    }

    /// Set the sampling ratio.
    pub fn sample_ratio(mut self, ratio: f64) -> Self {
        self.config.sample_ratio = ratio;
        self
    }

    /// Enable or disable span logging.
    pub fn log_spans(mut self, enabled: bool) -> Self {
        self.config.log_spans = enabled;
        self
    }

    /// Set the flush interval in milliseconds.
    pub fn flush_interval_ms(mut self, interval: u64) -> Self {
        self.config.flush_interval_ms = interval;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> TracerConfig {
        self.config
    }
}

impl Default for TracerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
