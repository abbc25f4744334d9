use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::OnceLock;
use tracing::info;

// Declare the static OnceLock to hold the Metrics.
static METRICS_INSTANCE: OnceLock<Metrics> = OnceLock::new();

/// Initializes on first use and returns the process-wide metrics.
pub fn get_metrics() -> &'static Metrics {
    METRICS_INSTANCE.get_or_init(|| {
        info!("Initializing Metrics ...");
        Metrics::new()
    })
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token refresh metrics
    pub token_refreshes: IntCounterVec,
    pub token_refresh_duration: HistogramVec,
    pub token_expiry_unix: IntGauge,

    // Routing metrics
    pub instance_lookups: IntCounterVec,

    // Config/runtime
    pub config_parse_failures: IntCounter,
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Self {
        let registry = Registry::new_custom(Some("redcapintegration".into()), None)
            .expect("metrics prefix is valid");

        let metrics = Self {
            // Token
            token_refreshes: IntCounterVec::new(Opts::new("token_refreshes_total", "Token refresh attempts by outcome"), &["outcome"]).expect("valid metric"),
            token_refresh_duration: HistogramVec::new(HistogramOpts::new("token_refresh_duration_seconds", "Token refresh duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["outcome"]).expect("valid metric"),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Expiry timestamp of the cached token").expect("valid metric"),

            // Routing
            instance_lookups: IntCounterVec::new(Opts::new("instance_lookups_total", "Source instance lookups by outcome"), &["outcome"]).expect("valid metric"),

            // Config/runtime
            config_parse_failures: IntCounter::new("config_parse_failures_total", "Config documents that failed to parse").expect("valid metric"),
            config_validation_errors: IntCounter::new("config_validation_errors_total", "Validation errors during startup").expect("valid metric"),
            up: IntGauge::new("up", "1 if service is serving").expect("valid metric"),

            registry,
        };

        // Register all metrics in the registry
        let reg = &metrics.registry;
        for collector in [
            Box::new(metrics.token_refreshes.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(metrics.token_refresh_duration.clone()),
            Box::new(metrics.token_expiry_unix.clone()),
            Box::new(metrics.instance_lookups.clone()),
            Box::new(metrics.config_parse_failures.clone()),
            Box::new(metrics.config_validation_errors.clone()),
            Box::new(metrics.up.clone()),
        ] {
            reg.register(collector).expect("metric registered once");
        }

        metrics
    }
}
