use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tracing::info;

use crate::config::settings::SettingsConfig;
use crate::lifecycle::Integration;
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;

#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub integration: Arc<Integration>,
}

impl AppState {
    pub fn new(metrics: &Metrics, integration: Arc<Integration>) -> Self {
        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            integration,
        }
    }
}

/// Routes served next to the integration: health, plus metrics when enabled.
pub fn router(settings_config: &SettingsConfig, integration: Arc<Integration>) -> Router {
    let state = AppState::new(get_metrics(), integration);
    Router::new()
        .merge(state.metrics_state.router(&settings_config.metrics))
        .with_state(state)
}

/// Bind the configured address and serve until the task is dropped.
pub async fn start(settings_config: &SettingsConfig, integration: Arc<Integration>) -> Result<()> {
    let metrics = get_metrics();
    let app = router(settings_config, integration);

    let bind_addr = format!(
        "{}:{}",
        settings_config.server.host, settings_config.server.port
    );
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", bind_addr))?;
    info!("serving health and metrics on {}", bind_addr);

    metrics.up.set(1);
    let served = axum::serve(listener, app).await.context("server failed");
    metrics.up.set(0);
    served
}
