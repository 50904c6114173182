//! Conversation error types

use maple_session::StoreError;
use thiserror::Error;

use crate::notice::Notice;

/// Failures the controller classifies before turning them into notices
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConversationError {
    #[error("Malformed server message: {reason}")]
    MalformedServerMessage { reason: String },

    #[error("Server error {code}: {message}")]
    Server { code: String, message: String },

    #[error("Connection failed: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Connection closed unexpectedly (code {})", .code.map(|c| c.to_string()).unwrap_or_else(|| "none".to_string()))]
    ConnectionClosed { code: Option<u16> },

    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    #[error("Session already exists: {id}")]
    SessionConflict { id: String },
}

impl ConversationError {
    /// Internal invariant violations, logged but never shown
    pub fn is_defect(&self) -> bool {
        matches!(
            self,
            ConversationError::SessionNotFound { .. } | ConversationError::SessionConflict { .. }
        )
    }

    /// The notice a user should see for this error, if any
    pub fn notice(&self) -> Option<Notice> {
        match self {
            ConversationError::Server { code, message } => Some(Notice::ServerError {
                code: code.clone(),
                message: message.clone(),
            }),
            ConversationError::MalformedServerMessage { reason } => {
                Some(Notice::MalformedMessage {
                    reason: reason.clone(),
                })
            }
            ConversationError::ConnectionFailed { .. }
            | ConversationError::ConnectionClosed { .. } => Some(Notice::ConnectionLost {
                detail: self.to_string(),
            }),
            ConversationError::SessionNotFound { .. }
            | ConversationError::SessionConflict { .. } => None,
        }
    }
}

impl From<StoreError> for ConversationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SessionNotFound { id } => ConversationError::SessionNotFound { id },
            StoreError::SessionAlreadyExists { id } => ConversationError::SessionConflict { id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_are_defects() {
        let err = ConversationError::from(StoreError::not_found("tmp-1"));
        assert!(err.is_defect());
        assert!(err.notice().is_none());
    }

    #[test]
    fn test_closed_message() {
        let err = ConversationError::ConnectionClosed { code: Some(1006) };
        assert_eq!(err.to_string(), "Connection closed unexpectedly (code 1006)");
        assert!(matches!(err.notice(), Some(Notice::ConnectionLost { .. })));
    }
}
