//! locner API Server
//!
//! REST API server for location recognition.
//!
//! Author: hephaex@gmail.com

use anyhow::Context;
use locner_api::{create_router, state::AppState};
use locner_core::config::{AppConfig, LoggingConfig};
use locner_extractor::LocationNer;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration: LOCNER_CONFIG points at an optional TOML file
    let config = match std::env::var("LOCNER_CONFIG") {
        Ok(path) => AppConfig::from_file(&path)?.with_env_override()?,
        Err(_) => AppConfig::from_env()?,
    };

    init_tracing(&config.logging);

    // Lexicons must load before the server accepts requests
    let ner = LocationNer::from_config(&config).context("Failed to load NER system")?;
    tracing::info!(
        gazetteer = ner.gazetteer().len(),
        types = ner.types().len(),
        model = ner.labeler_name(),
        "NER system loaded"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state and router
    let state = Arc::new(AppState::new(config, ner));
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Location NER API starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("locner_api={0},locner_extractor={0},tower_http=info", logging.level).into()
    });

    if logging.json_format {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
