use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique message identifier
pub type MessageId = String;

/// Titles are cut to this many characters
pub const TITLE_MAX_CHARS: usize = 30;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

/// A single chat message
///
/// Messages are immutable once created. Bot text is whatever markup the
/// server sent and is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a user message with a fresh local id
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            sender: Sender::User,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a bot message, keeping the server's answer id when it has one
    pub fn bot(question_id: Option<&str>, answer: impl Into<String>) -> Self {
        let id = match question_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => new_message_id(),
        };
        Self {
            id,
            sender: Sender::Bot,
            text: answer.into(),
            timestamp: Utc::now(),
        }
    }

    /// Override the timestamp (used for seeded history)
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// Generate a local message id
pub fn new_message_id() -> MessageId {
    Uuid::new_v4().to_string()
}

/// Derive a session title from the first user message
pub fn derive_title(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        let head: String = trimmed.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        trimmed.to_string()
    }
}
