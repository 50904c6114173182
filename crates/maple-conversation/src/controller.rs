//! # Conversation Controller
//!
//! Owns the session store, the connector, the lifecycle [`Phase`] and the
//! viewed-session axis. Every intent and every inbound envelope is handled to
//! completion before the next one, so invariants only need to hold between
//! calls.
//!
//! Errors from the transport and the protocol never escape: they are logged
//! and turned into [`Notice`]s the front end drains with
//! [`Controller::take_notices`].

use std::collections::VecDeque;

use maple_core::{ClientRequest, Language, Message, Region};
use maple_gateway::{is_normal_closure, ConnectionHandle, Connector, TransportEnvelope, TransportEvent};
use maple_session::{new_temp_session_id, Session, SessionId, SessionStore};
use tracing::{debug, debug_span, error, info, warn};

use crate::error::ConversationError;
use crate::notice::Notice;
use crate::phase::{Phase, PendingQuestion};
use crate::view::{ChatView, HistoryRow, InputState};

/// Why a send was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SendRejected {
    #[error("message is empty")]
    Empty,
    #[error("still connecting")]
    StillConnecting,
    #[error("waiting for an answer")]
    AwaitingAnswer,
    #[error("viewing a historical session")]
    ViewingHistory,
}

/// Startup settings
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub region: Region,
    pub language: Language,
    pub show_history: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            region: Region::None,
            language: Language::En,
            show_history: true,
        }
    }
}

/// Conversation lifecycle state machine
pub struct Controller<C: Connector> {
    store: SessionStore,
    connector: C,
    phase: Phase,
    viewed: Option<SessionId>,
    region: Region,
    language: Language,
    show_history: bool,
    notices: VecDeque<Notice>,
}

impl<C: Connector> std::fmt::Debug for Controller<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("phase", &self.phase)
            .field("viewed", &self.viewed)
            .field("region", &self.region)
            .field("language", &self.language)
            .field("sessions", &self.store.len())
            .finish()
    }
}

impl<C: Connector> Controller<C> {
    /// Create an idle controller over `store`, viewing its latest session
    pub fn new(connector: C, store: SessionStore, settings: ControllerSettings) -> Self {
        let viewed = store.latest().map(|session| session.id().to_string());
        Self {
            store,
            connector,
            phase: Phase::Idle,
            viewed,
            region: settings.region,
            language: settings.language,
            show_history: settings.show_history,
            notices: VecDeque::new(),
        }
    }

    // ---- intents ----

    /// Send a question from the input box
    ///
    /// On rejection the caller keeps the draft.
    pub fn send_message(&mut self, text: &str) -> Result<(), SendRejected> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendRejected::Empty);
        }

        match self.input_state() {
            InputState::Enabled => {}
            InputState::Connecting => {
                info!("Rejecting send while the first question is queued");
                self.notices.push_back(Notice::StillConnecting);
                return Err(SendRejected::StillConnecting);
            }
            InputState::AwaitingAnswer => return Err(SendRejected::AwaitingAnswer),
            InputState::ViewingHistory => return Err(SendRejected::ViewingHistory),
        }

        let phase = std::mem::take(&mut self.phase);
        self.phase = match phase {
            Phase::Idle => {
                let handle = self.connector.connect(self.region, self.language);
                self.start_session(handle, text)
            }
            Phase::Connecting {
                handle,
                session_id: None,
                ..
            } => self.start_session(handle, text),
            Phase::Connecting {
                handle,
                session_id: Some(session_id),
                ..
            } => {
                self.append(&session_id, Message::user(text));
                Phase::Connecting {
                    handle,
                    session_id: Some(session_id),
                    pending: Some(PendingQuestion {
                        text: text.to_string(),
                    }),
                }
            }
            Phase::Live { handle, session_id } => self.ask(handle, session_id, text),
            // input_state() already refused these
            other @ Phase::AwaitingAnswer { .. } => other,
        };
        Ok(())
    }

    /// Change region; restarts the conversation when the value changes
    pub fn set_region(&mut self, region: Region) {
        if region == self.region {
            return;
        }
        info!("Region changed {} -> {}", self.region, region);
        self.region = region;
        self.restart_conversation();
    }

    /// Change language; restarts the conversation when the value changes
    pub fn set_language(&mut self, language: Language) {
        if language == self.language {
            return;
        }
        info!("Language changed {} -> {}", self.language, language);
        self.language = language;
        self.restart_conversation();
    }

    /// View a session from history; never touches the connector
    pub fn select_session(&mut self, session_id: &str) {
        if self.store.contains(session_id) {
            debug!("Viewing session {}", session_id);
            self.viewed = Some(session_id.to_string());
        } else {
            warn!("Ignoring selection of unknown session {}", session_id);
        }
    }

    /// View the live session, or a blank new chat when there is none
    pub fn view_live(&mut self) {
        self.viewed = self.phase.session_id().map(str::to_string);
    }

    pub fn toggle_history(&mut self) {
        self.show_history = !self.show_history;
    }

    /// Best-effort polite close of the current connection
    pub fn shutdown(&mut self) {
        let phase = std::mem::take(&mut self.phase);
        if let Some(handle) = phase.handle() {
            info!("Shutting down {}", handle);
            self.connector.close(handle);
        }
        if let Some(pending) = phase.pending() {
            debug!("Dropping queued question on shutdown: {}", pending.text);
        }
    }

    /// Drain notices raised since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    // ---- transport events ----

    /// Apply one inbound transport event
    pub fn handle_envelope(&mut self, envelope: TransportEnvelope) {
        let span = debug_span!("envelope", handle = %envelope.handle, kind = envelope.event.kind());
        let _enter = span.enter();

        if self.phase.handle() != Some(envelope.handle) {
            debug!(
                "Discarding {} from stale {}",
                envelope.event.kind(),
                envelope.handle
            );
            return;
        }

        match envelope.event {
            TransportEvent::ConversationStarted { conversation_id } => {
                self.on_conversation_started(conversation_id)
            }
            TransportEvent::AnswerReceived {
                question_id,
                answer_text,
            } => self.on_answer(question_id, answer_text),
            TransportEvent::ServerError { code, message } => {
                self.fail(ConversationError::Server { code, message })
            }
            TransportEvent::Malformed { reason } => self.on_malformed(reason),
            TransportEvent::ConnectionClosed { code, was_clean } => {
                if is_normal_closure(code, was_clean) {
                    self.end_quietly();
                } else {
                    self.fail(ConversationError::ConnectionClosed { code })
                }
            }
            TransportEvent::ConnectionFailed { reason } => {
                self.fail(ConversationError::ConnectionFailed { reason })
            }
        }
    }

    fn on_conversation_started(&mut self, conversation_id: String) {
        let phase = std::mem::take(&mut self.phase);
        let (handle, session_id, pending) = match phase {
            Phase::Connecting {
                handle,
                session_id,
                pending,
            } => (handle, session_id, pending),
            other => {
                warn!(
                    "Ignoring duplicate conversation id {} in phase {}",
                    conversation_id,
                    other.name()
                );
                self.phase = other;
                return;
            }
        };

        info!("Conversation {} started on {}", conversation_id, handle);

        let live_id = match session_id {
            Some(temp_id) => {
                match self.store.rewrite_session_id(
                    &temp_id,
                    conversation_id.clone(),
                    self.region,
                    self.language,
                ) {
                    Ok(()) => {
                        if self.viewed.as_deref() == Some(temp_id.as_str()) {
                            self.viewed = Some(conversation_id.clone());
                        }
                        conversation_id
                    }
                    Err(e) => {
                        self.report(e.into());
                        temp_id
                    }
                }
            }
            None => {
                if let Err(e) =
                    self.store
                        .create_empty_session(conversation_id.clone(), self.region, self.language)
                {
                    self.report(e.into());
                }
                if self.viewed.is_none() {
                    self.viewed = Some(conversation_id.clone());
                }
                conversation_id
            }
        };

        let Some(question) = pending else {
            self.phase = Phase::Live {
                handle,
                session_id: live_id,
            };
            return;
        };

        let request = ClientRequest::question(question.text.clone(), self.region);
        match self.connector.send(handle, &request) {
            Ok(()) => {
                debug!("Sent queued question on {}", handle);
                self.phase = Phase::AwaitingAnswer {
                    handle,
                    session_id: live_id,
                };
            }
            Err(e) => {
                info!("Could not send queued question ({}), reconnecting for {}", e, live_id);
                let handle = self.connector.connect(self.region, self.language);
                self.phase = Phase::Connecting {
                    handle,
                    session_id: Some(live_id),
                    pending: Some(question),
                };
            }
        }
    }

    fn on_answer(&mut self, question_id: Option<String>, answer_text: String) {
        let phase = std::mem::take(&mut self.phase);
        self.phase = match phase {
            Phase::AwaitingAnswer { handle, session_id } | Phase::Live { handle, session_id } => {
                let message = Message::bot(question_id.as_deref(), answer_text);
                // Always the live session, whatever is being viewed.
                self.append(&session_id, message);
                Phase::Live { handle, session_id }
            }
            other => {
                warn!("Dropping answer received in phase {}", other.name());
                other
            }
        };
    }

    fn on_malformed(&mut self, reason: String) {
        self.report(ConversationError::MalformedServerMessage { reason });

        let phase = std::mem::take(&mut self.phase);
        self.phase = match phase {
            Phase::Connecting {
                handle,
                session_id,
                pending,
            } => {
                self.discard_pending(pending);
                Phase::Connecting {
                    handle,
                    session_id,
                    pending: None,
                }
            }
            // The unreadable frame used up the answer slot.
            Phase::AwaitingAnswer { handle, session_id } => Phase::Live { handle, session_id },
            other => other,
        };
    }

    /// Tear down the live slot after a failure and tell the user
    fn fail(&mut self, error: ConversationError) {
        info!("Conversation ended in phase {}", self.phase.name());
        self.report(error);
        self.drop_live_slot();
    }

    /// Normal closure: back to idle without a notice
    fn end_quietly(&mut self) {
        info!("Connection closed normally");
        self.drop_live_slot();
    }

    fn drop_live_slot(&mut self) {
        let phase = std::mem::take(&mut self.phase);
        if let Some(handle) = phase.handle() {
            self.connector.close(handle);
        }
        if let Phase::Connecting { pending, .. } = phase {
            self.discard_pending(pending);
        }
    }

    // ---- helpers ----

    fn start_session(&mut self, handle: ConnectionHandle, text: &str) -> Phase {
        let temp_id = new_temp_session_id();
        let session_id = match self.store.create_session(
            temp_id.clone(),
            self.region,
            self.language,
            Message::user(text),
        ) {
            Ok(session) => {
                debug!("Started session {} on {}", session.id(), handle);
                Some(temp_id)
            }
            Err(e) => {
                self.report(e.into());
                None
            }
        };
        self.viewed = session_id.clone();
        Phase::Connecting {
            handle,
            session_id,
            pending: Some(PendingQuestion {
                text: text.to_string(),
            }),
        }
    }

    fn ask(&mut self, handle: ConnectionHandle, session_id: SessionId, text: &str) -> Phase {
        self.append(&session_id, Message::user(text));

        let request = ClientRequest::question(text, self.region);
        match self.connector.send(handle, &request) {
            Ok(()) => Phase::AwaitingAnswer { handle, session_id },
            Err(e) => {
                info!("Send failed ({}), reconnecting for {}", e, session_id);
                let handle = self.connector.connect(self.region, self.language);
                Phase::Connecting {
                    handle,
                    session_id: Some(session_id),
                    pending: Some(PendingQuestion {
                        text: text.to_string(),
                    }),
                }
            }
        }
    }

    fn restart_conversation(&mut self) {
        let phase = std::mem::take(&mut self.phase);

        if let Some(session_id) = phase.session_id() {
            if self.store.remove_empty_session(session_id) {
                debug!("Removed empty live session {}", session_id);
            }
        }
        if let Some(handle) = phase.handle() {
            self.connector.close(handle);
        }
        if let Phase::Connecting { pending, .. } = phase {
            self.discard_pending(pending);
        }

        let handle = self.connector.connect(self.region, self.language);
        self.phase = Phase::Connecting {
            handle,
            session_id: None,
            pending: None,
        };
        self.viewed = None;
    }

    fn discard_pending(&mut self, pending: Option<PendingQuestion>) {
        if let Some(question) = pending {
            info!("Discarding queued question");
            self.notices.push_back(Notice::ResendRequired {
                question: question.text,
            });
        }
    }

    fn append(&mut self, session_id: &str, message: Message) {
        if let Err(e) = self.store.append_message(session_id, message) {
            self.report(e.into());
        }
    }

    /// Log `error`; anything user-facing also becomes a notice
    fn report(&mut self, error: ConversationError) {
        if error.is_defect() {
            error!("Invariant violated: {}", error);
        } else {
            warn!("{}", error);
            self.notices.extend(error.notice());
        }
    }

    // ---- queries ----

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn live_session_id(&self) -> Option<&str> {
        self.phase.session_id()
    }

    pub fn viewed_session_id(&self) -> Option<&str> {
        self.viewed.as_deref()
    }

    pub fn viewed_session(&self) -> Option<&Session> {
        self.viewed.as_deref().and_then(|id| self.store.by_id(id))
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn connector_mut(&mut self) -> &mut C {
        &mut self.connector
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn show_history(&self) -> bool {
        self.show_history
    }

    /// A connect or an answer is outstanding
    pub fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            Phase::Connecting { .. } | Phase::AwaitingAnswer { .. }
        )
    }

    pub fn input_state(&self) -> InputState {
        let viewed = self.viewed.as_deref();
        match &self.phase {
            Phase::Idle => InputState::Enabled,
            Phase::Connecting {
                pending: Some(_), ..
            } => InputState::Connecting,
            Phase::Connecting { session_id, .. } => {
                if viewed == session_id.as_deref() {
                    InputState::Enabled
                } else {
                    InputState::ViewingHistory
                }
            }
            Phase::Live { session_id, .. } => {
                if viewed == Some(session_id.as_str()) {
                    InputState::Enabled
                } else {
                    InputState::ViewingHistory
                }
            }
            Phase::AwaitingAnswer { session_id, .. } => {
                if viewed == Some(session_id.as_str()) {
                    InputState::AwaitingAnswer
                } else {
                    InputState::ViewingHistory
                }
            }
        }
    }

    pub fn chat_view(&self) -> ChatView<'_> {
        let messages = self.viewed_session().map(Session::messages).unwrap_or(&[]);
        let viewing_live = self.viewed.is_some() && self.viewed.as_deref() == self.phase.session_id();
        let typing = matches!(self.phase, Phase::AwaitingAnswer { .. })
            && viewing_live
            && messages.last().map(Message::is_user).unwrap_or(false);
        let connecting = matches!(self.phase, Phase::Connecting { .. });

        ChatView::build(messages, self.input_state(), typing, connecting, self.language)
    }

    /// History sidebar rows, live session first
    pub fn history_rows(&self) -> Vec<HistoryRow> {
        let live = self.phase.session_id();
        self.store
            .all(live)
            .into_iter()
            .map(|session| HistoryRow {
                id: session.id().to_string(),
                title: session.display_title().to_string(),
                start_time: session.start_time(),
                region: session.region(),
                language: session.language(),
                is_live: Some(session.id()) == live,
                is_selected: Some(session.id()) == self.viewed.as_deref(),
            })
            .collect()
    }
}
