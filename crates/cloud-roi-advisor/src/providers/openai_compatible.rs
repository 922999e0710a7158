use reqwest::Client;

use crate::config::OpenAiCompatibleConfig;
use crate::error::ProviderError;
use crate::prompt::build_messages;
use crate::providers::chat::{ChatCompletionRequest, ensure_query, read_completion};
use crate::traits::AdvisoryProvider;
use crate::types::{AdvisoryRequest, AdvisoryResponse};

/// Any `/v1/chat/completions` API that takes a bearer token.
#[derive(Clone)]
pub struct OpenAiCompatibleProvider {
    config: OpenAiCompatibleConfig,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Config("api key is empty".to_string()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait::async_trait]
impl AdvisoryProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        "openai-compatible"
    }

    async fn advise(&self, request: AdvisoryRequest) -> Result<AdvisoryResponse, ProviderError> {
        ensure_query(&request.query)?;

        let messages = build_messages(&request);
        let payload = ChatCompletionRequest::new(
            Some(self.config.model.as_str()),
            &messages,
            &self.config.sampling,
        );
        tracing::debug!(
            model = %self.config.model,
            turns = messages.len(),
            "sending chat completion"
        );

        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;
        let completion = read_completion(res).await?;

        Ok(AdvisoryResponse {
            provider: self.name().to_string(),
            model: completion.model.unwrap_or_else(|| self.config.model.clone()),
            advice: completion.content,
            usage_tokens: completion.usage_tokens,
        })
    }
}
