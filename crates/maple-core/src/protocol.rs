//! Wire protocol definitions
//!
//! Every frame is a JSON object `{"type": ..., "data": {...}}` sent as a
//! single WebSocket text frame.

use serde::{Deserialize, Serialize};

use crate::types::Region;

/// Frames sent from the client to the chat backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientRequest {
    /// Ask a question in the current conversation
    SubmitQuestionRequest {
        question: String,
        region: Region,
    },
    /// Polite shutdown notice sent before closing the socket
    Close {},
}

impl ClientRequest {
    pub fn question(question: impl Into<String>, region: Region) -> Self {
        Self::SubmitQuestionRequest {
            question: question.into(),
            region,
        }
    }

    pub fn close() -> Self {
        Self::Close {}
    }

    /// Encode as a text frame payload
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Frames sent from the chat backend to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    /// Sent unsolicited right after the socket opens
    InitiateConversationResponse { conversation_id: String },
    /// Answer to a submitted question; `answer` is rich markup
    SubmitQuestionResponse {
        #[serde(default)]
        question_id: Option<String>,
        answer: String,
    },
    /// Application level error
    Error { code: ErrorCode, message: String },
}

impl ServerMessage {
    /// Decode a text frame payload
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Server error codes arrive either as strings or numbers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorCode {
    Number(i64),
    Text(String),
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCode::Number(n) => write!(f, "{}", n),
            ErrorCode::Text(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_submit_question_shape() {
        let request = ClientRequest::question("Hello", Region::Ontario);
        let value: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"type": "SubmitQuestionRequest", "data": {"question": "Hello", "region": "Ontario"}})
        );
    }

    #[test]
    fn test_close_shape() {
        let value: serde_json::Value = serde_json::to_value(ClientRequest::close()).unwrap();
        assert_eq!(value, json!({"type": "Close", "data": {}}));
    }

    #[test]
    fn test_decode_initiate_conversation() {
        let msg = ServerMessage::from_json(
            r#"{"type":"InitiateConversationResponse","data":{"conversation_id":"c1"}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ServerMessage::InitiateConversationResponse {
                conversation_id: "c1".to_string()
            }
        );
    }

    #[test]
    fn test_decode_answer_without_question_id() {
        let msg = ServerMessage::from_json(
            r#"{"type":"SubmitQuestionResponse","data":{"answer":"<p>Hi</p>"}}"#,
        )
        .unwrap();
        match msg {
            ServerMessage::SubmitQuestionResponse { question_id, answer } => {
                assert!(question_id.is_none());
                assert_eq!(answer, "<p>Hi</p>");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_error_codes() {
        let numeric = ServerMessage::from_json(
            r#"{"type":"Error","data":{"code":500,"message":"boom"}}"#,
        )
        .unwrap();
        let textual = ServerMessage::from_json(
            r#"{"type":"Error","data":{"code":"RATE_LIMITED","message":"slow down"}}"#,
        )
        .unwrap();

        assert!(matches!(numeric, ServerMessage::Error { code: ErrorCode::Number(500), .. }));
        match textual {
            ServerMessage::Error { code, message } => {
                assert_eq!(code.to_string(), "RATE_LIMITED");
                assert_eq!(message, "slow down");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_missing_fields() {
        assert!(ServerMessage::from_json(r#"{"type":"InitiateConversationResponse","data":{}}"#).is_err());
        assert!(ServerMessage::from_json(r#"{"type":"Unknown","data":{}}"#).is_err());
        assert!(ServerMessage::from_json("not json").is_err());
    }
}
