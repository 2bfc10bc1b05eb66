//! Location NER service
//!
//! Combines the gazetteer, the type vocabulary and a sequence labeler
//! behind a single `extract` call.

use std::sync::Arc;

use locner_core::{AppConfig, Finding, Result, SequenceLabeler};

use crate::labeler::{DisabledLabeler, HttpLabeler};
use crate::lexicon::{Lexicon, MatchOptions};
use crate::reconcile::reconcile;

/// Location recognizer over static lexicons and an external model
pub struct LocationNer {
    gazetteer: Lexicon,
    types: Lexicon,
    labeler: Arc<dyn SequenceLabeler>,
    /// Model labels to keep (empty keeps all)
    labels: Vec<String>,
}

impl LocationNer {
    /// Create a new recognizer
    pub fn new(gazetteer: Lexicon, types: Lexicon, labeler: Arc<dyn SequenceLabeler>) -> Self {
        Self {
            gazetteer,
            types,
            labeler,
            labels: Vec::new(),
        }
    }

    /// Only keep model predictions carrying one of `labels`
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Load lexicons and build the labeler described by `config`.
    ///
    /// Fails if either lexicon cannot be loaded or is empty.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let options = MatchOptions::from(&config.lexicon);
        let gazetteer = Lexicon::load(&config.lexicon.gazetteer_path, options)?;
        let types = Lexicon::load(&config.lexicon.types_path, options)?;

        let labeler: Arc<dyn SequenceLabeler> = match HttpLabeler::from_config(&config.model)? {
            Some(labeler) => {
                tracing::info!(endpoint = labeler.name(), "Using model endpoint");
                Arc::new(labeler)
            }
            None => {
                tracing::warn!("No model endpoint configured, running lexicon-only");
                Arc::new(DisabledLabeler)
            }
        };

        Ok(Self::new(gazetteer, types, labeler).with_labels(config.model.labels.clone()))
    }

    /// Recognize location mentions in `text`.
    ///
    /// Labeler errors are returned as-is; there is no lexicon-only fallback.
    #[tracing::instrument(skip_all, fields(len = text.len()))]
    pub async fn extract(&self, text: &str) -> Result<Vec<Finding>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut predictions = self.labeler.label(text).await?;
        if !self.labels.is_empty() {
            predictions.retain(|p| self.labels.iter().any(|l| l == &p.label));
        }

        let findings = reconcile(text, &self.gazetteer, &self.types, &predictions);
        tracing::debug!(
            predictions = predictions.len(),
            findings = findings.len(),
            "Reconciled spans"
        );

        Ok(findings)
    }

    pub fn gazetteer(&self) -> &Lexicon {
        &self.gazetteer
    }

    pub fn types(&self) -> &Lexicon {
        &self.types
    }

    pub fn labeler_name(&self) -> &str {
        self.labeler.name()
    }
}

// ============================================================================
// Tests
// ============================================================================
