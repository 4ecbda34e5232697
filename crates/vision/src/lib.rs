//! Image-side services: captioning uploaded images with a vision chat model,
//! and rendering prompt previews.
//!
//! Neither touches the composition pipeline. A caption is free text a user
//! may feed back in as a character description; a preview consumes a
//! finished prompt string.

pub mod captioner;
pub mod preview;

pub use captioner::{CaptionError, VisionCaptioner};
pub use preview::{FALLBACK_PREVIEW_PROMPT, PlaceholderPreview, preview_prompt};

use reelprompt_config::AppConfig;
use reelprompt_core::ProviderError;
use reelprompt_providers::OpenAiCompatProvider;
use std::sync::Arc;
use std::time::Duration;

/// Build the captioner from `[captioning]`, or `None` when disabled.
///
/// The captioner is returned uninitialized; call
/// [`Captioner::initialize`](reelprompt_core::Captioner::initialize) once at
/// startup.
pub fn build_captioner(config: &AppConfig) -> Result<Option<Arc<VisionCaptioner>>, ProviderError> {
    if !config.captioning.enabled {
        return Ok(None);
    }
    let provider = OpenAiCompatProvider::new(
        "vision",
        config.captioning_base_url(),
        config.llm.api_key.clone(),
        Duration::from_secs(config.llm.timeout_secs),
    )?;
    Ok(Some(Arc::new(VisionCaptioner::new(
        Arc::new(provider),
        &config.captioning.model,
        config.captioning.max_tokens,
    ))))
}

/// Build the preview renderer from `[preview]`.
pub fn build_preview(config: &AppConfig) -> Arc<PlaceholderPreview> {
    Arc::new(PlaceholderPreview::new(&config.preview.placeholder_path))
}
