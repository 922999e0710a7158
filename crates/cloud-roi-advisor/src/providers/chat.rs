//! Chat-completions wire format shared by the Azure and OpenAI-style APIs.

use reqwest::Response;
use serde::{Deserialize, Serialize};

use crate::config::SamplingConfig;
use crate::error::ProviderError;
use crate::types::ChatMessage;

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl<'a> ChatCompletionRequest<'a> {
    pub fn new(
        model: Option<&'a str>,
        messages: &'a [ChatMessage],
        sampling: &SamplingConfig,
    ) -> Self {
        Self {
            model,
            messages,
            max_tokens: sampling.max_tokens,
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

pub(crate) struct Completion {
    pub model: Option<String>,
    pub content: String,
    pub usage_tokens: Option<u64>,
}

/// Turns an HTTP response into the first choice's text.
pub(crate) async fn read_completion(res: Response) -> Result<Completion, ProviderError> {
    if !res.status().is_success() {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        return Err(ProviderError::Api { status, body });
    }

    let parsed: ChatCompletionResponse = res.json().await?;
    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ProviderError::InvalidResponse("no message content in response".to_string()))?;

    Ok(Completion {
        model: parsed.model,
        content,
        usage_tokens: parsed.usage.and_then(|u| u.total_tokens),
    })
}

pub(crate) fn ensure_query(query: &str) -> Result<(), ProviderError> {
    if query.trim().is_empty() {
        return Err(ProviderError::Config("advisory query is empty".to_string()));
    }
    Ok(())
}
