//! Adapter from a chat [`Provider`] to the [`TextGenerator`] port.
//!
//! Every provider error is folded into [`Generation::Failed`] so a single
//! bad call never escapes as a panic or an `Err`.

use std::sync::Arc;

use async_trait::async_trait;
use reelprompt_core::{
    Generation, GenerationOptions, Message, Provider, ProviderRequest, TextGenerator,
};
use tracing::{debug, warn};

pub struct ProviderTextGenerator {
    provider: Arc<dyn Provider>,
}

impl ProviderTextGenerator {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl TextGenerator for ProviderTextGenerator {
    async fn generate(
        &self,
        system_instruction: &str,
        user_instruction: &str,
        options: &GenerationOptions,
    ) -> Generation {
        let request = ProviderRequest {
            model: options.model.clone(),
            messages: vec![
                Message::system(system_instruction),
                Message::user(user_instruction),
            ],
            temperature: options.temperature,
            max_tokens: Some(options.max_tokens),
            stream: options.stream,
        };

        match self.provider.complete(request).await {
            Ok(response) => {
                debug!(
                    provider = %self.provider.name(),
                    chars = response.message.content.len(),
                    "Generation completed"
                );
                Generation::text(response.message.content)
            }
            Err(e) => {
                warn!(provider = %self.provider.name(), error = %e, "Generation failed");
                Generation::failed(format!(
                    "request to {} failed: {e}",
                    self.provider.name()
                ))
            }
        }
    }
}
