use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use linodemcp_domain::health::{HealthState, HealthStatus};
use serde_json::json;
use tracing::error;

use super::probe::METRICS_COMPONENT;
use super::state::SidecarState;

const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

pub fn health_http_status(state: HealthState) -> StatusCode {
    match state {
        HealthState::Healthy => StatusCode::OK,
        HealthState::Degraded => StatusCode::PARTIAL_CONTENT,
        HealthState::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn health_response(status: HealthStatus) -> Response {
    (health_http_status(status.status), Json(status)).into_response()
}

/// `GET /metrics`
pub async fn metrics(State(state): State<Arc<SidecarState>>) -> Response {
    if !state.metrics_enabled {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics collection is disabled",
        )
            .into_response();
    }
    match state.metrics.encode_text() {
        Ok(body) => {
            let mut response = body.into_response();
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_FORMAT));
            response
        }
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response()
        }
    }
}

/// `GET /health`: liveness from the metrics subsystem alone.
pub async fn health(State(state): State<Arc<SidecarState>>) -> Response {
    let started = state.clock.now();
    let timestamp = state.clock.utc_now();
    let component = state.liveness.check_now();

    let mut components = BTreeMap::new();
    components.insert(METRICS_COMPONENT.to_string(), component);
    let elapsed = state.clock.now().saturating_duration_since(started);

    let mut status = HealthStatus::from_components(components, timestamp, elapsed);
    for (key, value) in state.metrics.summary() {
        status = status.with_metric(key, value);
    }
    health_response(status)
}

/// `GET /provider/health`: every attached probe, in parallel.
pub async fn provider_health(State(state): State<Arc<SidecarState>>) -> Response {
    let mut status = state.deep_health.execute().await;
    for (key, value) in state.metrics.summary() {
        status = status.with_metric(key, value);
    }
    health_response(status)
}

/// `GET /`
pub async fn index(State(state): State<Arc<SidecarState>>) -> Response {
    Json(json!({
        "service": state.service_name,
        "version": state.service_version,
        "endpoints": {
            "/": "service identity and endpoint map",
            "/health": "liveness",
            "/metrics": "Prometheus text exposition",
            "/provider/health": "deep health across all components",
        },
    }))
    .into_response()
}
