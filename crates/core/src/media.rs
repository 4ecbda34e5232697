//! Image-side ports: captioning an uploaded image and previewing a prompt.
//!
//! Both are independent of the composition pipeline. Captioning seeds the
//! composer with free text; previewing consumes its output.

use crate::generation::Generation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// What kind of caption to produce.
///
/// Parsed from the task tokens vision-language captioners conventionally
/// accept (`<CAPTION>`, `<DETAILED_CAPTION>`, `<MORE_DETAILED_CAPTION>`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionTask {
    Caption,
    DetailedCaption,
    #[default]
    MoreDetailedCaption,
}

impl CaptionTask {
    pub fn token(&self) -> &'static str {
        match self {
            Self::Caption => "<CAPTION>",
            Self::DetailedCaption => "<DETAILED_CAPTION>",
            Self::MoreDetailedCaption => "<MORE_DETAILED_CAPTION>",
        }
    }

    /// Instruction text sent to an instruction-following vision model.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Caption => "Write a one-sentence caption for this image.",
            Self::DetailedCaption => {
                "Describe this image in a short paragraph, covering the subject, setting, and style."
            }
            Self::MoreDetailedCaption => {
                "Describe this image in rich detail: the subject's appearance, clothing, and expression, \
the setting, lighting, camera framing, colors, and artistic style."
            }
        }
    }
}

impl FromStr for CaptionTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<CAPTION>" | "caption" => Ok(Self::Caption),
            "<DETAILED_CAPTION>" | "detailed_caption" => Ok(Self::DetailedCaption),
            "<MORE_DETAILED_CAPTION>" | "more_detailed_caption" => Ok(Self::MoreDetailedCaption),
            other => Err(format!("unsupported caption task: {other}")),
        }
    }
}

/// An expensive captioning model: initialize once, reuse across requests.
#[async_trait]
pub trait Captioner: Send + Sync {
    /// Load or verify the model. Idempotent; returns readiness.
    async fn initialize(&self) -> bool;

    /// Whether `initialize` has succeeded.
    async fn is_ready(&self) -> bool;

    /// Caption raw image bytes. Fails in-band when uninitialized.
    async fn caption(&self, image: &[u8], task: CaptionTask) -> Generation;
}

/// Turns a finished prompt string into a preview image path.
#[async_trait]
pub trait PreviewRenderer: Send + Sync {
    async fn preview(&self, prompt: &str) -> PathBuf;
}
