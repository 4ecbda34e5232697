//! The Text-Generation Port.
//!
//! "Given a system instruction and a user instruction, produce generated
//! text." Implementations never raise: a transport or parse failure comes
//! back as [`Generation::Failed`], and callers decide whether to fold it into
//! content as the `Error:` sentinel or to stop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Literal prefix of an in-band failure rendered as text.
pub const SENTINEL_PREFIX: &str = "Error:";

/// Outcome of one generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Generation {
    /// The model produced text.
    Text(String),
    /// The call failed; the payload is a human-readable reason.
    Failed(String),
}

impl Generation {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Classify a raw string from a sentinel-style backend.
    ///
    /// `"Error: timeout"` becomes `Failed("timeout")`; anything else is text.
    pub fn from_sentinel(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match raw.strip_prefix(SENTINEL_PREFIX) {
            Some(reason) => Self::Failed(reason.trim_start().to_string()),
            None => Self::Text(raw),
        }
    }

    /// Flatten into a string, rendering failures as `Error: {reason}`.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Failed(reason) => format!("{SENTINEL_PREFIX} {reason}"),
        }
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Failed(reason) => write!(f, "{SENTINEL_PREFIX} {reason}"),
        }
    }
}

/// Per-call generation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "local-model".into(),
            max_tokens: 500,
            temperature: 0.7,
            stream: false,
        }
    }
}

impl GenerationOptions {
    /// Same options with a different token cap (health pings, captions).
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// The abstract text-generation capability consumed by the composer.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produce text for the given instruction pair. Never fails out-of-band.
    async fn generate(
        &self,
        system_instruction: &str,
        user_instruction: &str,
        options: &GenerationOptions,
    ) -> Generation;
}
