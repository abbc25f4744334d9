use std::sync::Arc;

use axum::routing::get;
use axum::{extract::State, response::IntoResponse, Json, Router};
use http::{header::CONTENT_TYPE, StatusCode};
use prometheus::{Encoder, Registry, TextEncoder};
use serde::Serialize;
use tracing::error;

use crate::cache::token::TokenState;
use crate::config::settings::MetricsConfig;
use crate::server::server::AppState;

static HEALTH_PATH: &str = "/health";

#[derive(Clone)]
pub struct MetricsState {
    pub registry: Arc<Registry>,
}

impl MetricsState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn router(&self, metrics_config: &MetricsConfig) -> Router<AppState> {
        let mut router = Router::new().route(HEALTH_PATH, get(get_health));
        if metrics_config.is_enabled {
            router = router.route(metrics_config.path.as_str(), get(get_metrics));
        }
        router
    }
}

async fn get_metrics(State(state): State<AppState>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics_state.registry.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("failed to encode metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(CONTENT_TYPE, "text/plain")],
            String::new(),
        );
    }

    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        String::from_utf8_lossy(&buffer).into_owned(),
    )
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub version: String,
    pub mappings: usize,
    pub token: TokenReport,
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TokenReport {
    Absent,
    Valid { expires_at: u64 },
    Expired { expires_at: u64 },
    Error { error_code: String, error_description: String },
}

/// Token state without the token value.
async fn get_health(State(state): State<AppState>) -> Json<HealthReport> {
    let integration = &state.integration;
    let now = integration.tokens().now();
    let current = integration.tokens().current();

    let token = match current.state() {
        TokenState::Absent => TokenReport::Absent,
        TokenState::Issued { .. } => {
            let expires_at = current.expires_at().unwrap_or_default();
            if current.is_expired(now) {
                TokenReport::Expired { expires_at }
            } else {
                TokenReport::Valid { expires_at }
            }
        }
        TokenState::Rejected {
            error_code,
            error_description,
            ..
        } => TokenReport::Error {
            error_code: error_code.to_owned(),
            error_description: error_description.to_owned(),
        },
    };

    Json(HealthReport {
        version: integration.snapshot().version().to_owned(),
        mappings: integration.resolver().len(),
        token,
    })
}
