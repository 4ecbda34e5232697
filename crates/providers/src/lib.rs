//! LLM provider implementations for ReelPrompt.
//!
//! [`OpenAiCompatProvider`] speaks the `/chat/completions` protocol served by
//! LM Studio and most local inference servers. [`ProviderTextGenerator`]
//! adapts any provider to the composer's text-generation port.

pub mod generator;
pub mod openai_compat;

pub use generator::ProviderTextGenerator;
pub use openai_compat::OpenAiCompatProvider;

use std::sync::Arc;
use std::time::Duration;

use reelprompt_config::AppConfig;
use reelprompt_core::{ProviderError, TextGenerator};

/// Build the chat provider for the configured LLM endpoint.
pub fn build_provider(config: &AppConfig) -> Result<Arc<OpenAiCompatProvider>, ProviderError> {
    let provider = OpenAiCompatProvider::new(
        "lmstudio",
        &config.llm.base_url,
        config.llm.api_key.clone(),
        Duration::from_secs(config.llm.timeout_secs),
    )?;
    Ok(Arc::new(provider))
}

/// Build the text-generation port for the configured LLM endpoint.
pub fn build_generator(config: &AppConfig) -> Result<Arc<dyn TextGenerator>, ProviderError> {
    let provider = build_provider(config)?;
    Ok(Arc::new(ProviderTextGenerator::new(provider)))
}
