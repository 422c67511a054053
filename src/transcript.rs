//! In-memory conversation history for one chat session.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Ordered, append-only list of messages. Grows for the lifetime of the
/// session; there is no eviction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn as_list(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// JSON array of `{"role", "content"}` objects, in conversation order.
    pub fn serialize(&self) -> String {
        // Serializing plain strings and unit enum variants cannot fail.
        serde_json::to_string(&self.messages).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let messages = serde_json::from_str(text)?;
        Ok(Self { messages })
    }

    /// Drops the trailing user message of a turn that could not be completed.
    /// Returns it, or `None` when the last message is not from the user.
    pub(crate) fn rollback_user_turn(&mut self) -> Option<Message> {
        match self.messages.last() {
            Some(last) if last.role == Role::User => self.messages.pop(),
            _ => None,
        }
    }
}
