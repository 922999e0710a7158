use cloud_roi_core::{CalculationResults, InputValues};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A question about one evaluation. `history` holds earlier turns of the
/// same conversation, oldest first.
#[derive(Debug, Clone)]
pub struct AdvisoryRequest {
    pub inputs: InputValues,
    pub results: CalculationResults,
    pub query: String,
    pub history: Vec<ChatMessage>,
}

impl AdvisoryRequest {
    pub fn new(inputs: InputValues, results: CalculationResults, query: impl Into<String>) -> Self {
        Self {
            inputs,
            results,
            query: query.into(),
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdvisoryResponse {
    pub provider: String,
    pub model: String,
    pub advice: String,
    pub usage_tokens: Option<u64>,
}
