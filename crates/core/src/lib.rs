//! # ReelPrompt Core
//!
//! Domain types, traits, and error definitions for the ReelPrompt cinematic
//! prompt composer. This crate has **no transport dependencies**: it defines
//! the structured prompt schema, the assembler that flattens it, and the
//! ports (text generation, captioning, preview) the other crates implement.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here. Implementations live in their
//! respective crates, so the composition pipeline can be driven by a real
//! LLM server in production and by a scripted generator in tests.

pub mod error;
pub mod generation;
pub mod media;
pub mod message;
pub mod prompt;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::ProviderError;
pub use generation::{Generation, GenerationOptions, TextGenerator, SENTINEL_PREFIX};
pub use media::{CaptionTask, Captioner, PreviewRenderer};
pub use message::{ImagePart, Message, Role};
pub use prompt::{
    ArtisticStyle, CameraSetup, CharacterDetails, CinematicPrompt, EnvironmentDetails,
    LightingDetails, QUALITY_SUFFIX,
};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
