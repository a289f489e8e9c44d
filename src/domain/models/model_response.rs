use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Upper bound of every response score.
pub const MAX_SCORE: u32 = 100;

/// One provider's result for one dispatch round. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    model_id: String,
    text: String,
    score: u32,
    rationale: String,
    duration: Duration,
    success: bool,
}

impl ModelResponse {
    pub fn succeeded(model_id: impl Into<String>, text: impl Into<String>, duration: Duration) -> Self {
        Self {
            model_id: model_id.into(),
            text: text.into(),
            score: 0,
            rationale: String::new(),
            duration,
            success: true,
        }
    }

    /// A failed attempt: empty text, score 0, and the failure reason as rationale.
    pub fn failed(model_id: impl Into<String>, reason: impl Into<String>, duration: Duration) -> Self {
        Self {
            model_id: model_id.into(),
            text: String::new(),
            score: 0,
            rationale: reason.into(),
            duration,
            success: false,
        }
    }

    pub fn with_score(mut self, score: u32, rationale: impl Into<String>) -> Self {
        self.score = score.min(MAX_SCORE);
        self.rationale = rationale.into();
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Empty (or whitespace-only) text counts as a failure whatever the flag says.
    pub fn is_successful(&self) -> bool {
        self.success && !self.text.trim().is_empty()
    }
}
