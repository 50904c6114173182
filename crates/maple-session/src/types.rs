//! # Session Types

use chrono::{DateTime, Utc};
use maple_core::{derive_title, Language, Message, Region};
use serde::{Deserialize, Serialize};

/// Session identifier: temporary (`tmp-...`), server-assigned, or seeded
pub type SessionId = String;

/// Prefix of locally generated placeholder ids
pub const TEMP_ID_PREFIX: &str = "tmp-";

/// Shown for sessions that have no title yet
pub const UNTITLED: &str = "Untitled Chat";

/// Generate a placeholder id for a conversation the server has not confirmed
pub fn new_temp_session_id() -> SessionId {
    format!("{}{}", TEMP_ID_PREFIX, uuid::Uuid::new_v4())
}

/// A conversation and its messages
///
/// Fields are read-only outside this crate; `SessionStore` is the only
/// writer, which is what keeps the message list append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) start_time: DateTime<Utc>,
    pub(crate) region: Region,
    pub(crate) language: Language,
    pub(crate) messages: Vec<Message>,
    pub(crate) title: String,
}

impl Session {
    /// Build a view-only historical session with an explicit title
    pub fn historical(
        id: impl Into<SessionId>,
        start_time: DateTime<Utc>,
        region: Region,
        language: Language,
        title: impl Into<String>,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            id: id.into(),
            start_time,
            region,
            language,
            messages,
            title: title.into(),
        }
    }

    pub(crate) fn started_now(id: SessionId, region: Region, language: Language) -> Self {
        Self {
            id,
            start_time: Utc::now(),
            region,
            language,
            messages: Vec::new(),
            title: String::new(),
        }
    }

    pub(crate) fn push(&mut self, message: Message) {
        if self.title.is_empty() && message.is_user() {
            self.title = derive_title(&message.text);
        }
        self.messages.push(message);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Raw title, possibly empty
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Title for listings, never empty
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }
}
