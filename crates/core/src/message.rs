//! Message domain types.
//!
//! A generation call is a tiny two-message conversation: a system message
//! framing the role and a user message carrying the task. Caption requests
//! additionally attach an image to the user message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The caller's task instruction
    User,
    /// The model's reply
    Assistant,
    /// Role-framing instruction
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// An inline image attached to a message, already base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePart {
    /// MIME type, e.g. `image/png`
    pub mime_type: String,

    /// Standard base64 payload (no data-URL prefix)
    pub data_base64: String,
}

impl ImagePart {
    /// Render as a `data:` URL for OpenAI-style `image_url` content parts.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }
}

/// A single message sent to or received from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Attached images (user messages only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImagePart>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            images: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Attach an image to this message.
    pub fn with_image(mut self, image: ImagePart) -> Self {
        self.images.push(image);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_message() {
        let msg = Message::user("Describe the character 'Gandalf'.");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Describe the character 'Gandalf'.");
        assert!(msg.images.is_empty());
    }

    #[test]
    fn message_serialization_roundtrip() {
        let msg = Message::system("You are a lighting designer.");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"system\""));
        assert!(!json.contains("images"));
        let deserialized: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.content, "You are a lighting designer.");
        assert_eq!(deserialized.role, Role::System);
    }

    #[test]
    fn image_part_data_url() {
        let msg = Message::user("caption this").with_image(ImagePart {
            mime_type: "image/png".into(),
            data_base64: "iVBORw0KGgo=".into(),
        });
        assert_eq!(msg.images.len(), 1);
        assert_eq!(msg.images[0].data_url(), "data:image/png;base64,iVBORw0KGgo=");
    }
}
