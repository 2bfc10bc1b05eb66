//! Sequence labeler clients
//!
//! Provides the HTTP client for token-classification model servers and a
//! disabled labeler for lexicon-only deployments.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use locner_core::{ModelConfig, NerError, Prediction, Result, SequenceLabeler};

// ============================================================================
// HTTP labeler
// ============================================================================

/// Client for a token-classification endpoint
///
/// Speaks the Hugging Face inference API shape: the request body is
/// `{"inputs": text}` and the response is an array of
/// `{entity_group | entity, word, start, end, score}` where offsets count
/// characters.
pub struct HttpLabeler {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct LabelRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
struct RemoteEntity {
    #[serde(alias = "entity")]
    entity_group: String,
    #[serde(default)]
    word: String,
    start: Option<usize>,
    end: Option<usize>,
    score: Option<f32>,
}

impl HttpLabeler {
    /// Create a new client for `endpoint`
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NerError::Labeler(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
        })
    }

    /// Create from config, `None` when no endpoint is configured
    pub fn from_config(config: &ModelConfig) -> Result<Option<Self>> {
        let Some(endpoint) = config.endpoint.as_deref() else {
            return Ok(None);
        };

        let mut labeler = Self::new(endpoint, Duration::from_secs(config.timeout_secs))?;
        labeler.api_key = config.api_key.clone();
        Ok(Some(labeler))
    }

    /// Set the bearer token sent with each request
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Place `entity` in `text`. Entities without offsets are searched for
    /// from byte `from` onward, falling back to the first occurrence.
    fn to_prediction(
        text: &str,
        offsets: &CharOffsets,
        entity: RemoteEntity,
        from: usize,
    ) -> Option<Prediction> {
        let located = entity
            .start
            .zip(entity.end)
            .and_then(|(start, end)| Some((offsets.byte(start)?, offsets.byte(end)?)))
            .or_else(|| {
                let word = entity.word.trim();
                if word.is_empty() {
                    return None;
                }
                text.get(from..)
                    .and_then(|rest| rest.find(word))
                    .map(|i| from + i)
                    .or_else(|| text.find(word))
                    .map(|start| (start, start + word.len()))
            });

        match located {
            Some((start, end)) => Some(Prediction {
                text: text.get(start..end).unwrap_or_default().to_string(),
                label: entity.entity_group,
                start,
                end,
                score: entity.score,
            }),
            None => {
                tracing::warn!(
                    label = %entity.entity_group,
                    word = %entity.word,
                    "Could not place model prediction in input"
                );
                None
            }
        }
    }
}

#[async_trait]
impl SequenceLabeler for HttpLabeler {
    async fn label(&self, text: &str) -> Result<Vec<Prediction>> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&LabelRequest { inputs: text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| NerError::Labeler(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(NerError::Labeler(format!(
                "Model server returned {status}: {error_text}"
            )));
        }

        let entities: Vec<RemoteEntity> = response
            .json()
            .await
            .map_err(|e| NerError::Labeler(format!("Failed to parse response: {e}")))?;

        let offsets = CharOffsets::new(text);
        let mut cursor = 0;
        let predictions: Vec<Prediction> = entities
            .into_iter()
            .filter_map(|entity| {
                let prediction = Self::to_prediction(text, &offsets, entity, cursor)?;
                cursor = prediction.end;
                Some(prediction)
            })
            .collect();

        tracing::debug!(count = predictions.len(), "Model predictions received");
        Ok(predictions)
    }

    fn name(&self) -> &str {
        &self.endpoint
    }
}

/// Character index to byte offset table
struct CharOffsets {
    boundaries: Vec<usize>,
}

impl CharOffsets {
    fn new(text: &str) -> Self {
        let boundaries = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        Self { boundaries }
    }

    fn byte(&self, char_index: usize) -> Option<usize> {
        self.boundaries.get(char_index).copied()
    }
}

// ============================================================================
// Disabled labeler
// ============================================================================

/// Labeler used when no model endpoint is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledLabeler;

#[async_trait]
impl SequenceLabeler for DisabledLabeler {
    async fn label(&self, _text: &str) -> Result<Vec<Prediction>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

// ============================================================================
// Tests
// ============================================================================
