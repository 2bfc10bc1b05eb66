//! Text analysis handler
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use locner_core::{Finding, Source};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Instrument;
use utoipa::ToSchema;
use uuid::Uuid;

/// Analyze request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// Text to search for location mentions
    #[schema(example = "I visited Kathmandu and Pokhara last summer.")]
    pub text: String,
}

/// One recognized entity
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EntityView {
    /// Matched text, exactly as it appears in the input
    #[schema(example = "Kathmandu")]
    pub entity: String,

    /// `LOC`, `TYPE` or a model label
    #[serde(rename = "type")]
    #[schema(example = "LOC")]
    pub entity_type: String,

    /// Matching strategy that produced the entity
    pub source: Source,

    /// Byte offset of the first character
    pub start: usize,

    /// Byte offset one past the last character
    pub end: usize,

    /// Model confidence; null for lexicon matches
    #[schema(example = 0.87)]
    pub score: Option<f32>,
}

impl From<Finding> for EntityView {
    fn from(finding: Finding) -> Self {
        Self {
            entity: finding.text,
            entity_type: finding.entity_type.to_string(),
            source: finding.source,
            start: finding.start,
            end: finding.end,
            score: finding.score,
        }
    }
}

/// Analyze response body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeResponse {
    /// The analyzed text
    pub text: String,
    /// Entities ordered by position
    pub entities: Vec<EntityView>,
    #[schema(example = "success")]
    pub status: String,
}

/// Recognize locations and location types in text
#[utoipa::path(
    post,
    path = "/api/v1/analyze",
    tag = "analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Entities found in the text", body = AnalyzeResponse),
        (status = 400, description = "Malformed request", body = crate::error::ApiError),
        (status = 502, description = "Sequence labeler failed", body = crate::error::ApiError)
    )
)]
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("analyze", %request_id);

    let findings = state.ner.extract(&req.text).instrument(span.clone()).await?;
    span.in_scope(|| tracing::info!(entities = findings.len(), "Analyzed text"));

    Ok(Json(AnalyzeResponse {
        text: req.text,
        entities: findings.into_iter().map(EntityView::from).collect(),
        status: "success".to_string(),
    }))
}
