//! Prompt composition pipeline.
//!
//! Turns a character name into a fully populated [`CinematicPrompt`] by
//! driving a fixed fifteen-node DAG of text generations, each one fed by the
//! values its upstream steps already resolved plus any keyword hints the
//! knowledge base holds for the character.
//!
//! [`CinematicPrompt`]: reelprompt_core::CinematicPrompt

pub mod instructions;
pub mod name;
pub mod pipeline;
pub mod step;

#[cfg(test)]
pub(crate) mod testing;

pub use name::CharacterName;
pub use pipeline::{Composition, PromptComposer};
pub use step::{Step, StepRecord};

/// Why a composition did not produce a prompt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    /// Rejected before any generation call.
    #[error("Character name cannot be empty.")]
    EmptyCharacterName,

    /// Only raised under the short-circuit failure policy.
    #[error("composition step '{step}' failed: {reason}")]
    StepFailed { step: Step, reason: String },
}
