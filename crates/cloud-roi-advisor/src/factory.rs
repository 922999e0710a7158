use std::sync::Arc;

use crate::config::AdvisoryProviderConfig;
use crate::error::ProviderError;
use crate::providers::{AzureOpenAiProvider, OpenAiCompatibleProvider};
use crate::traits::AdvisoryProvider;

pub fn build_advisory_provider(
    cfg: AdvisoryProviderConfig,
) -> Result<Arc<dyn AdvisoryProvider>, ProviderError> {
    match cfg {
        AdvisoryProviderConfig::AzureOpenAi(c) => Ok(Arc::new(AzureOpenAiProvider::new(c)?)),
        AdvisoryProviderConfig::OpenAiCompatible(c) => {
            Ok(Arc::new(OpenAiCompatibleProvider::new(c)?))
        }
    }
}
