//! Error types for the ReelPrompt domain.
//!
//! Uses `thiserror`. Each bounded context owns its error enum: this crate
//! defines the provider transport errors, and the config, knowledge,
//! composer, and vision crates define theirs.

use thiserror::Error;

/// Why a chat-completion request produced no usable text.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Unexpected response structure: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}
