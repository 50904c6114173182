//! Offline connector
//!
//! Mimics the chat backend without a network: every connect is confirmed
//! with a fresh conversation id after a short delay and every question is
//! answered with a canned, localized HTML reply.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use maple_core::{ClientRequest, Language, Region};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::connector::{
    ConnectionHandle, Connector, HandleSequence, LinkState, TransportError, TransportResult,
};
use crate::event::{EventSender, TransportEnvelope, TransportEvent};

/// Mock connector configuration
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Delay before confirming a connection and before each answer
    pub reply_delay: Duration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(600),
        }
    }
}

enum Command {
    Ask { question: String, region: Region },
    Close,
}

struct MockLink {
    handle: ConnectionHandle,
    state: Arc<Mutex<LinkState>>,
    commands: mpsc::UnboundedSender<Command>,
}

/// Deterministic stand-in for [`crate::WsConnector`]
pub struct MockConnector {
    config: MockConfig,
    events: EventSender,
    handles: HandleSequence,
    questions: Arc<AtomicU64>,
    current: Option<MockLink>,
}

impl std::fmt::Debug for MockConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConnector")
            .field("config", &self.config)
            .field("current", &self.current.as_ref().map(|l| l.handle))
            .finish()
    }
}

impl MockConnector {
    pub fn new(config: MockConfig, events: EventSender) -> Self {
        Self {
            config,
            events,
            handles: HandleSequence::default(),
            questions: Arc::new(AtomicU64::new(0)),
            current: None,
        }
    }

    fn current(&self, handle: ConnectionHandle) -> Option<&MockLink> {
        self.current.as_ref().filter(|link| link.handle == handle)
    }
}

impl Connector for MockConnector {
    fn connect(&mut self, region: Region, language: Language) -> ConnectionHandle {
        if let Some(previous) = self.current.take() {
            let _ = previous.commands.send(Command::Close);
        }

        let handle = self.handles.next_handle();
        let state = Arc::new(Mutex::new(LinkState::Connecting));
        let (tx, rx) = mpsc::unbounded_channel();

        info!("{} mock connect (region={}, language={})", handle, region, language);

        tokio::spawn(run_mock_link(
            handle,
            language,
            self.config.reply_delay,
            state.clone(),
            rx,
            self.events.clone(),
            self.questions.clone(),
        ));

        self.current = Some(MockLink {
            handle,
            state,
            commands: tx,
        });
        handle
    }

    fn send(&mut self, handle: ConnectionHandle, request: &ClientRequest) -> TransportResult<()> {
        let link = self
            .current(handle)
            .filter(|link| *link.state.lock() == LinkState::Open)
            .ok_or(TransportError::NotConnected(handle))?;

        let command = match request {
            ClientRequest::SubmitQuestionRequest { question, region } => Command::Ask {
                question: question.clone(),
                region: *region,
            },
            ClientRequest::Close {} => Command::Close,
        };

        link.commands
            .send(command)
            .map_err(|_| TransportError::NotConnected(handle))
    }

    fn close(&mut self, handle: ConnectionHandle) {
        match self.current.take() {
            Some(link) if link.handle == handle => {
                let mut state = link.state.lock();
                if matches!(*state, LinkState::Connecting | LinkState::Open) {
                    *state = LinkState::Closing;
                    let _ = link.commands.send(Command::Close);
                }
            }
            other => self.current = other,
        }
    }

    fn is_open(&self, handle: ConnectionHandle) -> bool {
        self.current(handle)
            .map(|link| *link.state.lock() == LinkState::Open)
            .unwrap_or(false)
    }
}

async fn run_mock_link(
    handle: ConnectionHandle,
    language: Language,
    delay: Duration,
    state: Arc<Mutex<LinkState>>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: EventSender,
    questions: Arc<AtomicU64>,
) {
    let emit = |event: TransportEvent| {
        let _ = events.send(TransportEnvelope::new(handle, event));
    };

    // A close that arrives before the handshake completes cancels it silently.
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = commands.recv() => {
            *state.lock() = LinkState::Closed;
            debug!("{} mock connect cancelled", handle);
            return;
        }
    }

    {
        let mut state = state.lock();
        if *state != LinkState::Connecting {
            *state = LinkState::Closed;
            return;
        }
        *state = LinkState::Open;
    }
    emit(TransportEvent::ConversationStarted {
        conversation_id: format!("mock-conversation-{}", handle.raw()),
    });

    while let Some(command) = commands.recv().await {
        match command {
            Command::Ask { question, region } => {
                tokio::time::sleep(delay).await;
                if *state.lock() != LinkState::Open {
                    break;
                }
                let n = questions.fetch_add(1, Ordering::SeqCst) + 1;
                emit(TransportEvent::AnswerReceived {
                    question_id: Some(format!("mock-question-{}", n)),
                    answer_text: canned_answer(&question, region, language),
                });
            }
            Command::Close => break,
        }
    }

    *state.lock() = LinkState::Closed;
    emit(TransportEvent::ConnectionClosed {
        code: Some(1000),
        was_clean: true,
    });
}

fn canned_answer(question: &str, region: Region, language: Language) -> String {
    let question = html_escape::encode_text(question.trim());
    match language {
        Language::En => format!(
            "<p>Thanks for your question about <strong>{}</strong>: \u{201c}{}\u{201d}</p>\
             <p>This is a simulated answer from the offline assistant.</p>",
            region.label(),
            question
        ),
        Language::Fr => format!(
            "<p>Merci pour votre question concernant <strong>{}</strong> : \u{ab} {} \u{bb}</p>\
             <p>Ceci est une r\u{e9}ponse simul\u{e9}e de l'assistant hors ligne.</p>",
            region.label(),
            question
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_answer_escapes_markup() {
        let answer = canned_answer("<b>hi</b>", Region::Quebec, Language::Fr);
        assert!(answer.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(answer.contains("Quebec"));
        assert!(answer.starts_with("<p>Merci"));
    }

    #[test]
    fn test_canned_answer_escapes_ampersands() {
        let answer = canned_answer("Fees & permits", Region::Ontario, Language::En);
        assert!(answer.contains("Fees &amp; permits"));
    }
}
