//! Shared constants and invariants

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_FAILURE_COOLDOWN_SECS: u64 = 0;
pub const DEFAULT_SCOPES: [&str; 2] = ["read", "write"];

// Config location
pub const CONFIG_FILE_NAME: &str = "radar.yml";
pub const CONFIG_FOLDER_ENV: &str = "REDCAP_INTEGRATION_CONFIG_FOLDER";
pub const DEFAULT_CONFIG_FOLDER: &str = "/usr/local/etc/radar-redcap-int/";

// Supported log levels
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
