//! locner API - REST server
//!
//! Provides HTTP endpoints for recognizing locations in text.
//!
//! Author: hephaex@gmail.com

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::handlers::{analyze, health};
use crate::state::AppState;

/// OpenAPI document
#[derive(OpenApi)]
#[openapi(
    info(title = "Location NER API", description = "Identify location names and types in text"),
    paths(analyze::analyze_handler, health::health_check),
    components(schemas(
        analyze::AnalyzeRequest,
        analyze::AnalyzeResponse,
        analyze::EntityView,
        health::HealthResponse,
        error::ApiError,
        locner_core::Source
    )),
    tags(
        (name = "analyze", description = "Location recognition"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;
    let cors = cors_layer(&server.cors_origins);
    let timeout = Duration::from_secs(server.request_timeout_secs);
    let body_limit = server.max_body_size;

    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api/v1", routes::api_routes())
        .layer(from_fn_with_state(state.clone(), middleware::metrics_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy; any origin is allowed when none are configured
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(parsed))
}

/// Router over a small built-in gazetteer and no model, for tests
#[cfg(any(test, feature = "test-utils"))]
pub fn create_router_for_testing() -> Router {
    use locner_core::AppConfig;
    use locner_extractor::{DisabledLabeler, Lexicon, LocationNer, MatchOptions};

    let options = MatchOptions::default();
    let gazetteer = Lexicon::from_entries(["Kathmandu", "Pokhara", "Thamel Chowk"], options)
        .expect("static gazetteer");
    let types = Lexicon::from_entries(["hotel", "river", "lake"], options)
        .expect("static vocabulary");
    let ner = LocationNer::new(gazetteer, types, Arc::new(DisabledLabeler));

    create_router(Arc::new(AppState::new(AppConfig::default(), ner)))
}
