//! Core types for conversation state.

use serde::{Deserialize, Serialize};

/// Identifier for a single chat thread. Allocated monotonically; never
/// reused within a store lifetime.
pub type ChatId = u32;

/// Who produced a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message typed by the user.
    User,
    /// Reply returned by the backend.
    Assistant,
}

/// One message in a chat thread. Histories are append-only: messages are
/// never mutated or reordered.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message.
    pub role: Role,
    /// Raw message text as typed or as returned by the backend.
    pub content: String,
}

impl Message {
    /// Build a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Build an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Backend session key: the store-lifetime session stamp concatenated
/// with the chat id, so each chat maps to its own backend session.
#[must_use]
pub fn session_key(session: &str, chat_id: ChatId) -> String {
    format!("{session}{chat_id}")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Role::User).unwrap(),
            "\"user\"".to_string()
        );
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\"".to_string()
        );
    }

    #[test]
    fn test_message_round_trip() {
        let msg = Message::user("how do I file a 1099?");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.role, Role::User);
        assert_eq!(back.content, msg.content);
    }

    #[test]
    fn test_session_key_is_concatenation() {
        assert_eq!(session_key("1700000000000", 3), "17000000000003");
    }
}
