//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::{AppConfig, LogFormat};
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable naming an optional TOML config file.
pub const CONFIG_PATH_VAR: &str = "GUARD_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the startup configuration: defaults, then the file named by
/// `GUARD_CONFIG` (if set), then environment overrides, then validation.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    let lookup = |key: &str| std::env::var(key).ok();
    let base = match lookup(CONFIG_PATH_VAR) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        None => AppConfig::default(),
    };
    resolve(base, lookup)
}

/// Apply overrides from `lookup` to `config` and validate the result.
pub fn resolve<F>(mut config: AppConfig, lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overwrite fields of `config` with any recognised variable `lookup` yields.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = lookup("UPSTREAM_HOST") {
        config.upstream.host = v;
    }
    if let Some(v) = parsed(&lookup, "UPSTREAM_PORT")? {
        config.upstream.port = v;
    }
    if let Some(v) = lookup("UPSTREAM_PATH") {
        config.upstream.path = v;
    }
    // One deadline governs every upstream invocation.
    if let Some(v) = parsed(&lookup, "CALL_TIMEOUT_MS")? {
        config.upstream.timeout_ms = v;
        config.breaker.timeout_ms = v;
    }
    if let Some(v) = parsed(&lookup, "ERROR_THRESHOLD_PERCENT")? {
        config.breaker.error_threshold_percent = v;
    }
    if let Some(v) = parsed(&lookup, "RESET_TIMEOUT_MS")? {
        config.breaker.reset_timeout_ms = v;
    }
    if let Some(v) = parsed(&lookup, "BREAKER_MIN_CALLS")? {
        config.breaker.minimum_calls = v;
    }
    if let Some(v) = parsed(&lookup, "BREAKER_WINDOW_SIZE")? {
        config.breaker.window_size = v;
    }
    if let Some(v) = parsed(&lookup, "RETRY_MAX_ATTEMPTS")? {
        config.retry.max_attempts = v;
    }
    if let Some(v) = parsed(&lookup, "RETRY_BASE_DELAY_MS")? {
        config.retry.base_delay_ms = v;
    }
    if let Some(v) = parsed(&lookup, "RETRY_JITTER_MS")? {
        config.retry.jitter_ms = v;
    }
    if let Some(v) = parsed(&lookup, "BATCH_DEFAULT_COUNT")? {
        config.batch.default_count = v;
    }
    if let Some(v) = parsed(&lookup, "BATCH_MAX_COUNT")? {
        config.batch.max_count = v;
    }
    if let Some(v) = lookup("LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = lookup("LOG_FORMAT") {
        config.observability.log_format = match v.to_ascii_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            "compact" => LogFormat::Compact,
            _ => {
                return Err(ConfigError::InvalidValue {
                    var: "LOG_FORMAT",
                    value: v,
                })
            }
        };
    }
    if let Some(v) = parsed(&lookup, "METRICS_ENABLED")? {
        config.observability.metrics_enabled = v;
    }
    if let Some(v) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_address = v;
    }
    Ok(())
}

fn parsed<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
        None => Ok(None),
    }
}
