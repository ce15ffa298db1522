//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the guard.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream service location and per-call deadline.
    pub upstream: UpstreamConfig,

    /// Circuit breaker thresholds.
    pub breaker: BreakerConfig,

    /// Retry policy.
    pub retry: RetryConfig,

    /// Batch ("loop") call settings.
    pub batch: BatchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Whole-request timeout applied by the HTTP layer, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            request_timeout_secs: 300,
        }
    }
}

/// Upstream service configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream host name or IP.
    pub host: String,

    /// Upstream port.
    pub port: u16,

    /// Path requested on every call.
    pub path: String,

    /// Deadline for a single upstream call in milliseconds.
    pub timeout_ms: u64,
}

impl UpstreamConfig {
    /// Base URL of the upstream, without the path.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4000,
            path: "/data".to_string(),
            timeout_ms: 3000,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Deadline for a call admitted by the breaker in milliseconds.
    pub timeout_ms: u64,

    /// Failure rate (percent) at or above which the circuit opens.
    pub error_threshold_percent: u32,

    /// Time the circuit stays open before a probe is allowed, in milliseconds.
    pub reset_timeout_ms: u64,

    /// Minimum completed calls in the window before the rate is evaluated.
    pub minimum_calls: usize,

    /// Number of most recent calls kept in the rolling window.
    pub window_size: usize,
}

impl BreakerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 3000,
            error_threshold_percent: 50,
            reset_timeout_ms: 5000,
            minimum_calls: 5,
            window_size: 20,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Upper bound (exclusive) of the additive random jitter in milliseconds.
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 500,
            jitter_ms: 200,
        }
    }
}

/// Batch call configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Count used when a batch request does not specify one.
    pub default_count: usize,

    /// Largest accepted batch.
    pub max_count: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            default_count: 10,
            max_count: 1000,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Console log format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
