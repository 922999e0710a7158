pub mod azure_openai;
mod chat;
pub mod openai_compatible;

pub use azure_openai::AzureOpenAiProvider;
pub use openai_compatible::OpenAiCompatibleProvider;
