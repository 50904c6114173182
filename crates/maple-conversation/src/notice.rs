//! User-facing, non-blocking notices

use maple_core::Language;

use crate::i18n::Strings;

/// How loudly a notice should be shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Something the user should be told about
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// A send was refused because the first question is still queued
    StillConnecting,
    /// A queued question was discarded and must be typed again
    ResendRequired { question: String },
    /// The server reported an application error
    ServerError { code: String, message: String },
    /// An inbound frame could not be decoded
    MalformedMessage { reason: String },
    /// The connection failed or closed unexpectedly
    ConnectionLost { detail: String },
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Notice::StillConnecting => Severity::Info,
            Notice::ResendRequired { .. } | Notice::MalformedMessage { .. } => Severity::Warning,
            Notice::ServerError { .. } | Notice::ConnectionLost { .. } => Severity::Error,
        }
    }

    pub fn title(&self, language: Language) -> String {
        let s = Strings::for_language(language);
        match self {
            Notice::StillConnecting => s.still_connecting_title.to_string(),
            Notice::ResendRequired { .. } => s.resend_title.to_string(),
            Notice::ServerError { code, .. } => format!("{} ({})", s.server_error_title, code),
            Notice::MalformedMessage { .. } => s.malformed_title.to_string(),
            Notice::ConnectionLost { .. } => s.connection_lost_title.to_string(),
        }
    }

    /// Body text; server messages are shown verbatim
    pub fn description(&self, language: Language) -> String {
        let s = Strings::for_language(language);
        match self {
            Notice::StillConnecting => s.still_connecting.to_string(),
            Notice::ResendRequired { question } => {
                format!("{}: \"{}\"", s.resend_prefix, question)
            }
            Notice::ServerError { message, .. } => message.clone(),
            Notice::MalformedMessage { .. } => s.malformed.to_string(),
            Notice::ConnectionLost { .. } => s.connection_lost.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_is_verbatim() {
        let notice = Notice::ServerError {
            code: "E42".to_string(),
            message: "Quota exceeded".to_string(),
        };
        assert_eq!(notice.title(Language::En), "Server error (E42)");
        assert_eq!(notice.description(Language::Fr), "Quota exceeded");
        assert_eq!(notice.severity(), Severity::Error);
    }

    #[test]
    fn test_resend_mentions_question() {
        let notice = Notice::ResendRequired {
            question: "Bonjour".to_string(),
        };
        assert!(notice.description(Language::Fr).contains("Bonjour"));
        assert_eq!(notice.title(Language::En), "Message not sent");
    }
}
