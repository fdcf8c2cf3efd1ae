#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One transcript entry, serialized the way the chat endpoint expects its
/// `history` items.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: &str) -> ChatMessage {
        return ChatMessage {
            role,
            content: content.to_string(),
        };
    }

    pub fn user(content: &str) -> ChatMessage {
        return ChatMessage::new(Role::User, content);
    }

    pub fn assistant(content: &str) -> ChatMessage {
        return ChatMessage::new(Role::Assistant, content);
    }

    pub fn append(&mut self, text: &str) {
        self.content += text;
    }
}
