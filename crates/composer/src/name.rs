use crate::ComposeError;
use std::fmt;

/// A trimmed, non-empty character name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CharacterName(String);

impl CharacterName {
    pub fn parse(raw: &str) -> Result<Self, ComposeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ComposeError::EmptyCharacterName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CharacterName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CharacterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
