//! Session Chat
//!
//! Append-only message log carried inside the game state.

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

/// Chat lines that count as a greeting, compared case-insensitively.
pub const GREETINGS: [&str; 5] = ["hello", "hi", "hey", "greetings", "howdy"];

/// A single chat line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Display name of the sender.
    pub sender: String,
    /// Message body.
    pub text: String,
    /// When the message was written.
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a message stamped with the current time.
    pub fn new(sender: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            sent_at: Utc::now(),
        }
    }

    /// Is the whole message one of the known greetings?
    pub fn is_greeting(&self) -> bool {
        let text = self.text.trim().to_lowercase();
        GREETINGS.contains(&text.as_str())
    }
}

/// Ordered chat log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    messages: Vec<ChatMessage>,
}

impl Chat {
    /// Append a message.
    pub fn write_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Most recent message.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True when nothing has been said yet.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
