//! WebSocket connector against an in-process server

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use maple_core::{ClientRequest, Language, Region};
use maple_gateway::{
    event_channel, Connector, EventReceiver, TransportEnvelope, TransportEvent, WsConfig,
    WsConnector,
};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

async fn next_event(rx: &mut EventReceiver) -> TransportEnvelope {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Accepts one client, greets it with a conversation id, answers each
/// question, and reports every text frame it receives.
async fn spawn_server() -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        let (mut sender, mut receiver) = ws.split();

        sender
            .send(Message::Text(
                r#"{"type":"InitiateConversationResponse","data":{"conversation_id":"conv-42"}}"#
                    .to_string(),
            ))
            .await
            .unwrap();

        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    let _ = seen_tx.send(text.clone());
                    if text.contains("SubmitQuestionRequest") {
                        let reply = r#"{"type":"SubmitQuestionResponse","data":{"question_id":"q-1","answer":"<p>Yes</p>"}}"#;
                        let _ = sender.send(Message::Text(reply.to_string())).await;
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    (format!("ws://{}/ws", addr), seen_rx)
}

#[tokio::test]
async fn test_round_trip_and_polite_close() {
    let (endpoint, mut seen) = spawn_server().await;
    let (tx, mut rx) = event_channel();
    let config = WsConfig {
        endpoint,
        close_grace: Duration::from_millis(500),
    };
    let mut connector = WsConnector::new(config, tx).unwrap();

    let handle = connector.connect(Region::Atlantic, Language::En);
    let started = next_event(&mut rx).await;
    assert_eq!(started.handle, handle);
    assert_eq!(
        started.event,
        TransportEvent::ConversationStarted {
            conversation_id: "conv-42".to_string()
        }
    );
    assert!(connector.is_open(handle));

    connector
        .send(handle, &ClientRequest::question("Is it open?", Region::Atlantic))
        .unwrap();
    assert_eq!(
        next_event(&mut rx).await.event,
        TransportEvent::AnswerReceived {
            question_id: Some("q-1".to_string()),
            answer_text: "<p>Yes</p>".to_string()
        }
    );

    let question = seen.recv().await.unwrap();
    assert!(question.contains(r#""question":"Is it open?""#));
    assert!(question.contains(r#""region":"Atlantic""#));

    connector.close(handle);
    let closed = next_event(&mut rx).await;
    assert_eq!(
        closed.event,
        TransportEvent::ConnectionClosed {
            code: Some(1000),
            was_clean: true
        }
    );
    assert_eq!(seen.recv().await.unwrap(), r#"{"type":"Close","data":{}}"#);
}

#[tokio::test]
async fn test_unreachable_endpoint_reports_failure() {
    // Bind and drop to get a port nobody is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (tx, mut rx) = event_channel();
    let config = WsConfig {
        endpoint: format!("ws://{}/ws", addr),
        ..Default::default()
    };
    let mut connector = WsConnector::new(config, tx).unwrap();
    let handle = connector.connect(Region::None, Language::En);

    let event = next_event(&mut rx).await;
    assert_eq!(event.handle, handle);
    match event.event {
        TransportEvent::ConnectionFailed { reason } => {
            assert!(reason.starts_with("WebSocket error"), "{}", reason)
        }
        other => panic!("expected ConnectionFailed, got {:?}", other),
    }
    assert!(!connector.is_open(handle));
}

#[tokio::test]
async fn test_server_close_is_reported_clean() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let frame = CloseFrame {
            code: CloseCode::Away,
            reason: "".into(),
        };
        ws.send(Message::Close(Some(frame))).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let (tx, mut rx) = event_channel();
    let config = WsConfig {
        endpoint: format!("ws://{}/ws", addr),
        ..Default::default()
    };
    let mut connector = WsConnector::new(config, tx).unwrap();
    let handle = connector.connect(Region::None, Language::En);

    let closed = next_event(&mut rx).await;
    assert_eq!(closed.handle, handle);
    assert_eq!(
        closed.event,
        TransportEvent::ConnectionClosed {
            code: Some(1001),
            was_clean: true
        }
    );
    assert!(!connector.is_open(handle));
}
