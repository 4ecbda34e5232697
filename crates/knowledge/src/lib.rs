//! Character knowledge base.
//!
//! A static, preloaded mapping from character name to keyword hints. The
//! composer consults it to bias generation, never to replace it. Loading is
//! best-effort: a missing or malformed source yields an empty knowledge base
//! and a warning, and composition proceeds on pure generation.
//!
//! Source format (JSON object keyed by display name):
//!
//! ```json
//! {
//!   "Marge Simpson": {
//!     "visual_keywords": ["tall blue beehive hair", "yellow skin"],
//!     "negative_prompt_keywords": ["realistic human skin"]
//!   }
//! }
//! ```
//!
//! camelCase keys (`visualKeywords`, …) are accepted as well.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Known trait keywords for one character. Every list is optional: `None`
/// means "no hint available" and is left out of generation instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterTraits {
    #[serde(default, alias = "visualKeywords", skip_serializing_if = "Option::is_none")]
    pub visual_keywords: Option<Vec<String>>,

    #[serde(default, alias = "outfitKeywords", skip_serializing_if = "Option::is_none")]
    pub outfit_keywords: Option<Vec<String>>,

    #[serde(default, alias = "expressionKeywords", skip_serializing_if = "Option::is_none")]
    pub expression_keywords: Option<Vec<String>>,

    #[serde(default, alias = "environmentKeywords", skip_serializing_if = "Option::is_none")]
    pub environment_keywords: Option<Vec<String>>,

    #[serde(default, alias = "genreKeywords", skip_serializing_if = "Option::is_none")]
    pub genre_keywords: Option<Vec<String>>,

    #[serde(
        default,
        alias = "negativePromptKeywords",
        skip_serializing_if = "Option::is_none"
    )]
    pub negative_prompt_keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    traits: CharacterTraits,
}

/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    entries: HashMap<String, Entry>,
}

impl KnowledgeBase {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from a JSON file, falling back to an empty knowledge base.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(kb) => {
                info!(path = %path.display(), characters = kb.len(), "Knowledge base loaded");
                kb
            }
            Err(e) => {
                warn!(error = %e, "Knowledge base unavailable, composing without trait hints");
                Self::empty()
            }
        }
    }

    /// Load from a JSON file, reporting why it could not be used.
    pub fn try_load(path: &Path) -> Result<Self, KnowledgeError> {
        if !path.exists() {
            return Err(KnowledgeError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| KnowledgeError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_json(&content).map_err(|e| KnowledgeError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Parse a JSON document of `name -> traits` records.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let records: BTreeMap<String, CharacterTraits> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    /// Build from records. Names colliding case-insensitively keep the first
    /// in sorted order.
    pub fn from_records(records: BTreeMap<String, CharacterTraits>) -> Self {
        let mut entries: HashMap<String, Entry> = HashMap::with_capacity(records.len());
        for (name, traits) in records {
            let key = name.to_lowercase();
            if let Some(existing) = entries.get(&key) {
                warn!(
                    kept = %existing.name,
                    ignored = %name,
                    "Duplicate character name in knowledge base"
                );
                continue;
            }
            entries.insert(key, Entry { name, traits });
        }
        Self { entries }
    }

    /// Case-insensitive exact match; no partial or fuzzy matching.
    pub fn lookup(&self, name: &str) -> Option<&CharacterTraits> {
        self.entries.get(&name.to_lowercase()).map(|e| &e.traits)
    }

    /// Display names of all known characters, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.values().map(|e| e.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("knowledge base not found at {0}")]
    NotFound(PathBuf),

    #[error("failed to read knowledge base at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("failed to parse knowledge base at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },
}
