use reqwest::Client;

use crate::config::AzureOpenAiConfig;
use crate::error::ProviderError;
use crate::prompt::build_messages;
use crate::providers::chat::{ChatCompletionRequest, ensure_query, read_completion};
use crate::traits::AdvisoryProvider;
use crate::types::{AdvisoryRequest, AdvisoryResponse};

/// Azure OpenAI chat deployment, authenticated with the `api-key` header.
#[derive(Clone)]
pub struct AzureOpenAiProvider {
    config: AzureOpenAiConfig,
    client: Client,
}

impl AzureOpenAiProvider {
    pub fn new(config: AzureOpenAiConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Config(
                "azure openai api key is empty".to_string(),
            ));
        }
        if config.endpoint.trim().is_empty() {
            return Err(ProviderError::Config(
                "azure openai endpoint is empty".to_string(),
            ));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }
}

#[async_trait::async_trait]
impl AdvisoryProvider for AzureOpenAiProvider {
    fn name(&self) -> &'static str {
        "azure-openai"
    }

    async fn advise(&self, request: AdvisoryRequest) -> Result<AdvisoryResponse, ProviderError> {
        ensure_query(&request.query)?;

        let messages = build_messages(&request);
        let payload = ChatCompletionRequest::new(None, &messages, &self.config.sampling);
        tracing::debug!(
            deployment = %self.config.deployment,
            turns = messages.len(),
            "sending azure openai chat completion"
        );

        let res = self
            .client
            .post(self.endpoint())
            .header("api-key", &self.config.api_key)
            .json(&payload)
            .send()
            .await?;
        let completion = read_completion(res).await?;

        Ok(AdvisoryResponse {
            provider: self.name().to_string(),
            model: completion
                .model
                .unwrap_or_else(|| self.config.deployment.clone()),
            advice: completion.content,
            usage_tokens: completion.usage_tokens,
        })
    }
}
