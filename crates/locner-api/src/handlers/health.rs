//! Health check handlers
//!
//! Author: hephaex@gmail.com

use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Banner response for the root path
#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
}

pub async fn root() -> impl IntoResponse {
    Json(RootResponse {
        message: "Location NER API is running. Use /api/v1/analyze to analyze text.".to_string(),
    })
}

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of gazetteer entries loaded
    pub gazetteer_entries: usize,
    /// Number of type vocabulary entries loaded
    pub type_entries: usize,
    /// Sequence labeler in use
    pub model: String,
    /// RFC 3339 start time
    pub started_at: String,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        gazetteer_entries: state.ner.gazetteer().len(),
        type_entries: state.ner.types().len(),
        model: state.ner.labeler_name().to_string(),
        started_at: state.started_at.to_rfc3339(),
    })
}

/// JSON metrics response
#[derive(Serialize)]
pub struct MetricsResponse {
    pub uptime_seconds: u64,
    pub total_requests: u64,
    pub requests_per_second: f64,
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime = state.uptime_secs();
    let total_requests = state.get_request_count();
    let rps = if uptime > 0 {
        total_requests as f64 / uptime as f64
    } else {
        0.0
    };

    Json(MetricsResponse {
        uptime_seconds: uptime,
        total_requests,
        requests_per_second: rps,
    })
}
