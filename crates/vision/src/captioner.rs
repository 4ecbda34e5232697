//! Vision-model captioner.
//!
//! The captioning model is an expensive shared resource: it is verified once
//! by [`Captioner::initialize`] and reused by every later request. Requests go
//! over the same OpenAI-compatible chat protocol as text generation, with the
//! image attached as a base64 data URL.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use reelprompt_core::{
    CaptionTask, Captioner, Generation, ImagePart, Message, Provider, ProviderError,
    ProviderRequest,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// LM Studio routes this name to whatever model is loaded.
const WILDCARD_MODEL: &str = "local-model";

/// Captions are descriptive, not creative.
const CAPTION_TEMPERATURE: f32 = 0.2;

#[derive(Debug, thiserror::Error)]
pub enum CaptionError {
    #[error("Captioning model is not initialized")]
    NotInitialized,

    #[error("image is empty")]
    EmptyImage,

    #[error("unsupported image data ({0})")]
    UnsupportedImage(String),

    #[error("model '{model}' is not served by {provider}")]
    ModelUnavailable { model: String, provider: String },

    #[error("{provider} is not reachable")]
    Unreachable { provider: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Clone)]
struct LoadedModel {
    model: String,
    loaded_at: DateTime<Utc>,
}

/// Captions images with a vision chat model behind a [`Provider`].
pub struct VisionCaptioner {
    provider: Arc<dyn Provider>,
    model: String,
    max_tokens: u32,
    state: Mutex<Option<LoadedModel>>,
}

impl VisionCaptioner {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens,
            state: Mutex::new(None),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// When `initialize` last succeeded.
    pub async fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.as_ref().map(|s| s.loaded_at)
    }

    async fn verify(&self) -> Result<LoadedModel, CaptionError> {
        let provider = self.provider.name().to_string();
        if !self.provider.health_check().await? {
            return Err(CaptionError::Unreachable { provider });
        }

        if self.model != WILDCARD_MODEL {
            let models = self.provider.list_models().await?;
            if !models.iter().any(|m| m == &self.model) {
                return Err(CaptionError::ModelUnavailable {
                    model: self.model.clone(),
                    provider,
                });
            }
        }

        Ok(LoadedModel {
            model: self.model.clone(),
            loaded_at: Utc::now(),
        })
    }

    /// Caption with typed errors; [`Captioner::caption`] folds these in-band.
    pub async fn try_caption(&self, image: &[u8], task: CaptionTask) -> Result<String, CaptionError> {
        let model = match self.state.lock().await.as_ref() {
            Some(loaded) => loaded.model.clone(),
            None => return Err(CaptionError::NotInitialized),
        };

        let image = encode_image(image)?;
        debug!(mime = %image.mime_type, task = task.token(), "Captioning image");

        let request = ProviderRequest {
            model,
            messages: vec![Message::user(task.instruction()).with_image(image)],
            temperature: CAPTION_TEMPERATURE,
            max_tokens: Some(self.max_tokens),
            stream: false,
        };

        let response = self.provider.complete(request).await?;
        Ok(response.message.content)
    }
}

#[async_trait]
impl Captioner for VisionCaptioner {
    async fn initialize(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.is_some() {
            return true;
        }

        match self.verify().await {
            Ok(loaded) => {
                info!(model = %loaded.model, provider = self.provider.name(), "Captioning model ready");
                *state = Some(loaded);
                true
            }
            Err(e) => {
                warn!(error = %e, "Captioning model failed to initialize");
                false
            }
        }
    }

    async fn is_ready(&self) -> bool {
        self.state.lock().await.is_some()
    }

    async fn caption(&self, image: &[u8], task: CaptionTask) -> Generation {
        match self.try_caption(image, task).await {
            Ok(text) => Generation::text(text),
            Err(e) => {
                warn!(error = %e, "Captioning failed");
                Generation::failed(e.to_string())
            }
        }
    }
}

/// Sniff the image type and base64-encode it for a content part.
fn encode_image(bytes: &[u8]) -> Result<ImagePart, CaptionError> {
    if bytes.is_empty() {
        return Err(CaptionError::EmptyImage);
    }
    let kind = infer::get(bytes)
        .ok_or_else(|| CaptionError::UnsupportedImage("unrecognized format".into()))?;
    if kind.matcher_type() != infer::MatcherType::Image {
        return Err(CaptionError::UnsupportedImage(kind.mime_type().to_string()));
    }
    Ok(ImagePart {
        mime_type: kind.mime_type().to_string(),
        data_base64: general_purpose::STANDARD.encode(bytes),
    })
}
