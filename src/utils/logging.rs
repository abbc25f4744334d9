use clap::ValueEnum;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::settings::{LogFormat, LoggingConfig};
use crate::config::snapshot::ConfigurationSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    TRACE,
    DEBUG,
    INFO,
    WARN,
    ERROR,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match *self {
            LogLevel::TRACE => "trace",
            LogLevel::DEBUG => "debug",
            LogLevel::INFO => "info",
            LogLevel::WARN => "warn",
            LogLevel::ERROR => "error",
        }
    }
}

/// Logging config after applying the command line override. The level given
/// on the command line wins over the configured one.
pub fn effective_logging(
    snapshot: &ConfigurationSnapshot,
    arg_log_level: Option<LogLevel>,
) -> LoggingConfig {
    let configured = snapshot.settings().logging.clone().unwrap_or_default();
    match arg_log_level {
        Some(level) => LoggingConfig::new(level.as_str().to_owned(), configured.format),
        None => configured,
    }
}

pub fn run(snapshot: &ConfigurationSnapshot, arg_log_level: Option<LogLevel>) {
    init_logging(&effective_logging(snapshot, arg_log_level));
}

/// Initialize tracing with the desired config.
pub fn init_logging(cfg: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(&cfg.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match cfg.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .flatten_event(true)
                .with_ansi(false); // CRI parsers dislike ANSI color codes

            let _ = registry.with(layer).try_init();
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(true);

            let _ = registry.with(layer).try_init();
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::snapshot::tests::document;

    #[test]
    fn command_line_level_overrides_configured_one() {
        let mut doc = document("https://mp.example.org/managementportal/");
        doc.settings.logging = Some(LoggingConfig::new("warn".into(), LogFormat::Json));
        let snapshot = ConfigurationSnapshot::from_document(doc).unwrap();

        let configured = effective_logging(&snapshot, None);
        assert_eq!(configured.level, "warn");
        assert_eq!(configured.format, LogFormat::Json);

        let overridden = effective_logging(&snapshot, Some(LogLevel::DEBUG));
        assert_eq!(overridden.level, "debug");
        assert_eq!(overridden.format, LogFormat::Json);
    }

    #[test]
    fn missing_logging_section_defaults_to_info() {
        let snapshot =
            ConfigurationSnapshot::from_document(document("https://mp.example.org/")).unwrap();
        let cfg = effective_logging(&snapshot, None);
        assert_eq!(cfg.level, "info");
        assert_eq!(cfg.format, LogFormat::Compact);
    }
}
