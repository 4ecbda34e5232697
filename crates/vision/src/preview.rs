//! Preview rendering.
//!
//! No image model is wired in yet: [`PlaceholderPreview`] logs the prompt it
//! was asked to render and hands back a fixed placeholder image.

use async_trait::async_trait;
use reelprompt_core::{PreviewRenderer, SENTINEL_PREFIX};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Sent to the renderer instead of a prompt that carries a failed step.
pub const FALLBACK_PREVIEW_PROMPT: &str = "Test prompt for ComfyUI stub if main prompt failed";

const LOGGED_PROMPT_CHARS: usize = 100;

/// The prompt a preview should be rendered from.
pub fn preview_prompt(prompt_string: &str) -> &str {
    if prompt_string.contains(SENTINEL_PREFIX) {
        FALLBACK_PREVIEW_PROMPT
    } else {
        prompt_string
    }
}

#[derive(Debug, Clone)]
pub struct PlaceholderPreview {
    path: PathBuf,
}

impl PlaceholderPreview {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PreviewRenderer for PlaceholderPreview {
    async fn preview(&self, prompt: &str) -> PathBuf {
        let shown: String = prompt.chars().take(LOGGED_PROMPT_CHARS).collect();
        let ellipsis = if prompt.chars().count() > LOGGED_PROMPT_CHARS { "..." } else { "" };
        info!(prompt = %format!("{shown}{ellipsis}"), "Rendering placeholder preview");

        if !self.path.exists() {
            warn!(path = %self.path.display(), "Placeholder preview image is missing");
        }
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_prompts_fall_back_to_test_prompt() {
        assert_eq!(
            preview_prompt("A knight in a Error: timeout"),
            FALLBACK_PREVIEW_PROMPT
        );
        assert_eq!(preview_prompt("A knight at dawn"), "A knight at dawn");
    }

    #[tokio::test]
    async fn returns_placeholder_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let renderer = PlaceholderPreview::new(&path);
        assert_eq!(renderer.preview(&"x".repeat(500)).await, path);
    }

    #[tokio::test]
    async fn missing_placeholder_still_returns_path() {
        let renderer = PlaceholderPreview::new("does/not/exist.jpg");
        assert_eq!(
            renderer.preview("anything").await,
            PathBuf::from("does/not/exist.jpg")
        );
    }
}
