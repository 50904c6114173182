//! Derived view models
//!
//! Nothing here is stored; every value is computed from the controller's
//! phase and viewed session on demand.

use chrono::{DateTime, Local, Utc};
use maple_core::{Language, Message, Region};
use maple_session::SessionId;

use crate::i18n::Strings;

/// Whether the message input accepts text, and if not, why
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    Enabled,
    Connecting,
    AwaitingAnswer,
    ViewingHistory,
}

impl InputState {
    pub fn is_enabled(&self) -> bool {
        matches!(self, InputState::Enabled)
    }
}

/// Everything the message area needs to render
#[derive(Debug, Clone)]
pub struct ChatView<'a> {
    pub messages: &'a [Message],
    pub input: InputState,
    pub placeholder: &'static str,
    pub send_label: &'static str,
    /// Activity line under the messages
    pub activity: Option<&'static str>,
    /// Title and hint shown when there are no messages
    pub empty_state: Option<(&'static str, &'static str)>,
}

impl<'a> ChatView<'a> {
    pub(crate) fn build(
        messages: &'a [Message],
        input: InputState,
        typing: bool,
        connecting: bool,
        language: Language,
    ) -> Self {
        let s = Strings::for_language(language);
        let viewing_history = input == InputState::ViewingHistory;

        let activity = if typing {
            Some(s.typing)
        } else if connecting && messages.is_empty() {
            Some(s.connecting)
        } else {
            None
        };

        let empty_state = match (messages.is_empty(), viewing_history) {
            (false, _) => None,
            (true, true) => Some((s.historical_title, s.historical_hint)),
            (true, false) => Some((s.empty_title, s.empty_hint)),
        };

        Self {
            messages,
            input,
            placeholder: if viewing_history {
                s.placeholder_history
            } else {
                s.placeholder
            },
            send_label: s.send,
            activity,
            empty_state,
        }
    }
}

/// One entry of the history sidebar
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub id: SessionId,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub region: Region,
    pub language: Language,
    pub is_live: bool,
    pub is_selected: bool,
}

impl HistoryRow {
    pub fn start_label(&self) -> String {
        format_history_time(self.start_time)
    }
}

/// `yyyy-MM-dd HH:mm` in local time
pub fn format_history_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// `h:mm AM/PM` in local time
pub fn format_message_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%-I:%M %p").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_states() {
        let fresh = ChatView::build(&[], InputState::Enabled, false, false, Language::En);
        assert_eq!(fresh.empty_state, Some(("No messages yet.", "Start a conversation!")));
        assert_eq!(fresh.placeholder, "Type your message...");
        assert_eq!(fresh.activity, None);

        let history = ChatView::build(&[], InputState::ViewingHistory, false, false, Language::En);
        assert_eq!(
            history.empty_state.map(|(title, _)| title),
            Some("This is a historical chat session.")
        );
        assert_eq!(history.placeholder, "Viewing historical chat...");
    }

    #[test]
    fn test_activity_lines() {
        let messages = vec![Message::user("Hello")];
        let typing = ChatView::build(&messages, InputState::AwaitingAnswer, true, false, Language::En);
        assert_eq!(typing.activity, Some("Bot is typing..."));

        let connecting = ChatView::build(&[], InputState::Enabled, false, true, Language::Fr);
        assert_eq!(connecting.activity, Some("Connexion au clavardage..."));
        assert_eq!(connecting.send_label, "Envoyer");
        assert_eq!(connecting.placeholder, "Écrivez votre message...");
    }

    #[test]
    fn test_history_time_format() {
        let label = format_history_time(Utc::now());
        assert_eq!(label.len(), "2024-01-01 12:00".len());
        let time = format_message_time(Utc::now());
        assert!(time.ends_with("AM") || time.ends_with("PM"));
    }
}
