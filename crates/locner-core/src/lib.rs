//! locner Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout locner:
//! - Spans and findings produced by the recognizer
//! - Entity types and provenance tags
//! - The sequence labeler seam for external models
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{AppConfig, ConfigError, LexiconConfig, LoggingConfig, ModelConfig, ServerConfig};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for locner operations
#[derive(Error, Debug)]
pub enum NerError {
    #[error("Failed to read lexicon {path}: {source}")]
    LexiconLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse lexicon {path}: {message}")]
    LexiconParse { path: PathBuf, message: String },

    #[error("Lexicon {0} contains no entries")]
    EmptyLexicon(PathBuf),

    #[error("Sequence labeler error: {0}")]
    Labeler(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, NerError>;

// ============================================================================
// Spans
// ============================================================================

/// Half-open byte interval `[start, end)` into an input text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// True when the two intervals share at least one position.
    /// Adjacent spans (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Slice `text` at this span, if the span is non-empty and lies on
    /// UTF-8 boundaries inside the text.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        if self.is_empty() {
            return None;
        }
        text.get(self.start..self.end)
    }
}

// ============================================================================
// Entity Types and Provenance
// ============================================================================

/// Entity type attached to a finding
///
/// Lexicon matches carry a fixed tag; model predictions keep whatever
/// label the model emitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum EntityType {
    /// Known place name from the gazetteer
    Loc,
    /// Generic location-type word
    Type,
    /// Label assigned by the sequence labeler
    Model(String),
}

impl EntityType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Loc => "LOC",
            Self::Type => "TYPE",
            Self::Model(label) => label,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<EntityType> for String {
    fn from(value: EntityType) -> Self {
        match value {
            EntityType::Model(label) => label,
            other => other.as_str().to_string(),
        }
    }
}

impl From<String> for EntityType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "LOC" => Self::Loc,
            "TYPE" => Self::Type,
            _ => Self::Model(value),
        }
    }
}

/// Which matching strategy produced a finding
///
/// Variants are declared in priority order: when spans conflict, an
/// earlier variant always wins over a later one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    ExactMatch,
    TypeMatch,
    Model,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExactMatch => "exact_match",
            Self::TypeMatch => "type_match",
            Self::Model => "model",
        }
    }

    /// Priority rank, 0 is the most trusted
    pub fn rank(&self) -> u8 {
        match self {
            Self::ExactMatch => 0,
            Self::TypeMatch => 1,
            Self::Model => 2,
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Findings and Predictions
// ============================================================================

/// A recognized entity mention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Finding {
    /// Exact substring of the input
    #[schema(example = "Kathmandu")]
    pub text: String,

    /// Byte offset where the mention starts
    #[schema(example = 10)]
    pub start: usize,

    /// Byte offset one past the end of the mention
    #[schema(example = 19)]
    pub end: usize,

    /// `LOC`, `TYPE` or the model's label
    #[schema(value_type = String, example = "LOC")]
    pub entity_type: EntityType,

    /// Matching strategy that produced this finding
    pub source: Source,

    /// Model confidence, for diagnostics only; `None` for lexicon matches
    #[serde(default)]
    #[schema(example = 0.87)]
    pub score: Option<f32>,
}

impl Finding {
    /// Build a finding for `span` of `text`.
    ///
    /// Returns `None` when the span is empty or does not lie on valid
    /// boundaries of `text`.
    pub fn from_span(
        text: &str,
        span: Span,
        entity_type: EntityType,
        source: Source,
    ) -> Option<Self> {
        let slice = span.slice(text)?;
        Some(Self {
            text: slice.to_string(),
            start: span.start,
            end: span.end,
            entity_type,
            source,
            score: None,
        })
    }

    pub fn with_score(mut self, score: Option<f32>) -> Self {
        self.score = score;
        self
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// Raw prediction returned by a sequence labeler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Span text as reported by the model
    pub text: String,
    /// Model label (e.g. `LOC`, `GPE`)
    pub label: String,
    /// Byte offset into the input
    pub start: usize,
    /// Byte offset one past the end
    pub end: usize,
    /// Model confidence, if reported
    pub score: Option<f32>,
}

impl Prediction {
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Pre-trained sequence labeling model
///
/// Treated as an opaque oracle: given raw text it returns labeled spans.
/// Errors are propagated to callers unchanged.
#[async_trait]
pub trait SequenceLabeler: Send + Sync {
    /// Label spans in `text`
    async fn label(&self, text: &str) -> Result<Vec<Prediction>>;

    /// Human-readable name for logs and health output
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================
