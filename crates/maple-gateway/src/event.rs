//! Inbound transport events

use maple_core::ServerMessage;
use tokio::sync::mpsc;
use tracing::warn;

use crate::connector::ConnectionHandle;

/// Something that happened on a connection
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// The server assigned a conversation id
    ConversationStarted { conversation_id: String },
    /// Answer to a submitted question
    AnswerReceived {
        question_id: Option<String>,
        answer_text: String,
    },
    /// Application error reported by the server
    ServerError { code: String, message: String },
    /// A text frame that could not be decoded
    Malformed { reason: String },
    /// The connection closed
    ConnectionClosed { code: Option<u16>, was_clean: bool },
    /// The connection could not be established
    ConnectionFailed { reason: String },
}

impl TransportEvent {
    /// Decode a text frame into an event
    pub fn from_frame(text: &str) -> Self {
        match ServerMessage::from_json(text) {
            Ok(ServerMessage::InitiateConversationResponse { conversation_id }) => {
                TransportEvent::ConversationStarted { conversation_id }
            }
            Ok(ServerMessage::SubmitQuestionResponse { question_id, answer }) => {
                TransportEvent::AnswerReceived {
                    question_id,
                    answer_text: answer,
                }
            }
            Ok(ServerMessage::Error { code, message }) => TransportEvent::ServerError {
                code: code.to_string(),
                message,
            },
            Err(e) => {
                warn!("Undecodable frame: {}", e);
                TransportEvent::Malformed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Short kind name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            TransportEvent::ConversationStarted { .. } => "conversation_started",
            TransportEvent::AnswerReceived { .. } => "answer_received",
            TransportEvent::ServerError { .. } => "server_error",
            TransportEvent::Malformed { .. } => "malformed",
            TransportEvent::ConnectionClosed { .. } => "connection_closed",
            TransportEvent::ConnectionFailed { .. } => "connection_failed",
        }
    }
}

/// An event tagged with the connection it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct TransportEnvelope {
    pub handle: ConnectionHandle,
    pub event: TransportEvent,
}

impl TransportEnvelope {
    pub fn new(handle: ConnectionHandle, event: TransportEvent) -> Self {
        Self { handle, event }
    }
}

pub type EventSender = mpsc::UnboundedSender<TransportEnvelope>;
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEnvelope>;

/// Create the single inbound event channel
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Close code 1000, or no code at all, on a clean close
///
/// 1005 is what browsers and tungstenite report when the peer's close frame
/// carried no status.
pub fn is_normal_closure(code: Option<u16>, was_clean: bool) -> bool {
    was_clean && matches!(code, None | Some(1000) | Some(1005))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_frame_maps_server_messages() {
        assert_eq!(
            TransportEvent::from_frame(
                r#"{"type":"InitiateConversationResponse","data":{"conversation_id":"c1"}}"#
            ),
            TransportEvent::ConversationStarted {
                conversation_id: "c1".to_string()
            }
        );
        assert_eq!(
            TransportEvent::from_frame(
                r#"{"type":"SubmitQuestionResponse","data":{"question_id":"q1","answer":"<p>Hi</p>"}}"#
            ),
            TransportEvent::AnswerReceived {
                question_id: Some("q1".to_string()),
                answer_text: "<p>Hi</p>".to_string()
            }
        );
        assert_eq!(
            TransportEvent::from_frame(r#"{"type":"Error","data":{"code":429,"message":"busy"}}"#),
            TransportEvent::ServerError {
                code: "429".to_string(),
                message: "busy".to_string()
            }
        );
    }

    #[test]
    fn test_from_frame_malformed() {
        let event = TransportEvent::from_frame(r#"{"type":"SubmitQuestionResponse","data":{}}"#);
        assert_eq!(event.kind(), "malformed");
    }

    #[test]
    fn test_normal_closure_rules() {
        assert!(is_normal_closure(Some(1000), true));
        assert!(is_normal_closure(None, true));
        assert!(is_normal_closure(Some(1005), true));
        assert!(!is_normal_closure(Some(1000), false));
        assert!(!is_normal_closure(Some(1006), true));
        assert!(!is_normal_closure(Some(4001), true));
    }
}
