use std::time::Duration;

pub const DEFAULT_AZURE_DEPLOYMENT: &str = "gpt-4o";
pub const DEFAULT_AZURE_API_VERSION: &str = "2025-01-01-preview";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Generation parameters sent with every chat completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 800,
            temperature: 0.7,
            top_p: 0.95,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AzureOpenAiConfig {
    pub api_key: String,
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub deployment: String,
    pub api_version: String,
    pub timeout: Duration,
    pub sampling: SamplingConfig,
}

impl AzureOpenAiConfig {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            deployment: DEFAULT_AZURE_DEPLOYMENT.to_string(),
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            sampling: SamplingConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub sampling: SamplingConfig,
}

impl OpenAiCompatibleConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: "https://api.openai.com".to_string(),
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
            sampling: SamplingConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AdvisoryProviderConfig {
    AzureOpenAi(AzureOpenAiConfig),
    OpenAiCompatible(OpenAiCompatibleConfig),
}
