//! Query response types.

use serde::{Deserialize, Serialize};

/// Attribution for a retrieved chunk, returned alongside the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Human-readable label, e.g. "Intro to Testing - Lesson 2"
    pub text: String,

    /// Lesson link when known, otherwise the course link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Source {
    pub fn new(text: impl Into<String>, link: Option<String>) -> Self {
        Self {
            text: text.into(),
            link,
        }
    }
}

/// Result of one query turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Final answer text from the model
    pub answer: String,

    /// Sources gathered by every tool call of the turn, in call order
    pub sources: Vec<Source>,

    /// Session the exchange was recorded in
    pub session_id: String,
}
