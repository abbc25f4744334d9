use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_FAILURE_COOLDOWN_SECS, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_SCOPES,
};

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SettingsConfig {
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub authority: AuthorityConfig,
}

/// ================================
/// Authority (token endpoint) client
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct AuthorityConfig {
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// after a failed refresh, the errored token is served for this many
    /// seconds before a new attempt. 0 disables the cooldown
    #[serde(default = "default_failure_cooldown_seconds")]
    pub failure_cooldown_seconds: u64,
    /// request one token during startup; a failure only logs a warning
    #[serde(default = "default_prime_on_start")]
    pub prime_on_start: bool,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            scopes: default_scopes(),
            request_timeout_ms: default_request_timeout_ms(),
            failure_cooldown_seconds: default_failure_cooldown_seconds(),
            prime_on_start: default_prime_on_start(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            is_enabled: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info".to_owned(), LogFormat::Compact)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_scopes() -> Vec<String> {
    DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

fn default_failure_cooldown_seconds() -> u64 {
    DEFAULT_FAILURE_COOLDOWN_SECS
}

fn default_prime_on_start() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}
