use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{AdvisoryRequest, AdvisoryResponse};

#[async_trait]
pub trait AdvisoryProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn advise(&self, request: AdvisoryRequest) -> Result<AdvisoryResponse, ProviderError>;
}
