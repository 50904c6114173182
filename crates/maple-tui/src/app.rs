use std::collections::VecDeque;
use std::time::{Duration, Instant};

use maple_conversation::{Controller, InputState, Notice, Phase, SendRejected};
use maple_gateway::{Connector, TransportEnvelope};
use tracing::debug;

/// How long a toast stays in the status bar
pub const TOAST_TTL: Duration = Duration::from_secs(4);
const MAX_TOASTS: usize = 3;

pub type BoxedConnector = Box<dyn Connector + Send>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Live,
    Waiting,
}

impl ConnectionStatus {
    pub fn from_phase(phase: &Phase) -> Self {
        match phase {
            Phase::Idle => ConnectionStatus::Idle,
            Phase::Connecting { .. } => ConnectionStatus::Connecting,
            Phase::Live { .. } => ConnectionStatus::Live,
            Phase::AwaitingAnswer { .. } => ConnectionStatus::Waiting,
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Idle => write!(f, "○ Idle"),
            ConnectionStatus::Connecting => write!(f, "◐ Connecting"),
            ConnectionStatus::Live => write!(f, "● Live"),
            ConnectionStatus::Waiting => write!(f, "● Waiting"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub notice: Notice,
    pub shown_at: Instant,
}

pub struct App<C: Connector = BoxedConnector> {
    pub controller: Controller<C>,
    pub input: String,
    pub toasts: VecDeque<Toast>,
    pub scroll_offset: u16,
    pub should_quit: bool,
}

impl<C: Connector> App<C> {
    pub fn new(controller: Controller<C>) -> Self {
        Self {
            controller,
            input: String::new(),
            toasts: VecDeque::new(),
            scroll_offset: 0,
            should_quit: false,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::from_phase(self.controller.phase())
    }

    pub fn push_char(&mut self, c: char) {
        if self.controller.input_state().is_enabled() {
            self.input.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if self.controller.input_state().is_enabled() {
            self.input.pop();
        }
    }

    /// Send the draft; a rejected send keeps it
    pub fn submit(&mut self) {
        let span = maple_observability::conversation_span(
            self.controller.live_session_id().unwrap_or("new"),
        );
        let _enter = span.enter();

        match self.controller.send_message(&self.input) {
            Ok(()) => {
                self.input.clear();
                self.scroll_offset = 0;
            }
            Err(SendRejected::Empty) => {}
            Err(reason) => debug!("Send rejected: {:?}", reason),
        }
        self.collect_notices();
    }

    pub fn on_envelope(&mut self, envelope: TransportEnvelope) {
        let span = maple_observability::connection_span(envelope.handle);
        let _enter = span.enter();
        self.controller.handle_envelope(envelope);
        self.collect_notices();
    }

    pub fn cycle_region(&mut self) {
        let next = self.controller.region().next();
        self.controller.set_region(next);
        self.collect_notices();
    }

    pub fn cycle_language(&mut self) {
        let next = self.controller.language().next();
        self.controller.set_language(next);
        self.collect_notices();
    }

    pub fn toggle_history(&mut self) {
        self.controller.toggle_history();
    }

    /// Move the viewed session one row up the history list
    pub fn select_previous(&mut self) {
        let rows = self.controller.history_rows();
        if rows.is_empty() {
            return;
        }
        let index = match rows.iter().position(|row| row.is_selected) {
            Some(0) => 0,
            Some(i) => i - 1,
            None => rows.len() - 1,
        };
        self.view_row(&rows[index].id);
    }

    /// Move the viewed session one row down the history list
    pub fn select_next(&mut self) {
        let rows = self.controller.history_rows();
        if rows.is_empty() {
            return;
        }
        let index = match rows.iter().position(|row| row.is_selected) {
            Some(i) => (i + 1).min(rows.len() - 1),
            None => 0,
        };
        self.view_row(&rows[index].id);
    }

    pub fn jump_live(&mut self) {
        self.controller.view_live();
        self.scroll_offset = 0;
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    pub fn on_tick(&mut self) {
        let now = Instant::now();
        self.toasts
            .retain(|toast| now.duration_since(toast.shown_at) < TOAST_TTL);
    }

    /// Politely close the connection and leave the event loop
    pub fn quit(&mut self) {
        self.controller.shutdown();
        self.should_quit = true;
    }

    fn view_row(&mut self, id: &str) {
        self.controller.select_session(id);
        self.scroll_offset = 0;
        if self.controller.input_state() == InputState::ViewingHistory {
            self.input.clear();
        }
    }

    fn collect_notices(&mut self) {
        for notice in self.controller.take_notices() {
            self.toasts.push_back(Toast {
                notice,
                shown_at: Instant::now(),
            });
        }
        while self.toasts.len() > MAX_TOASTS {
            self.toasts.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maple_conversation::ControllerSettings;
    use maple_core::{Language, Region};
    use maple_gateway::{event_channel, EventReceiver, MockConfig, MockConnector};
    use maple_session::{sample_history, SessionStore};

    fn app() -> (App<MockConnector>, EventReceiver) {
        let (tx, rx) = event_channel();
        let connector = MockConnector::new(
            MockConfig {
                reply_delay: Duration::from_millis(5),
            },
            tx,
        );
        let store = SessionStore::with_history(sample_history(chrono::Utc::now()));
        let controller = Controller::new(connector, store, ControllerSettings::default());
        (App::new(controller), rx)
    }

    fn type_text<C: Connector>(app: &mut App<C>, text: &str) {
        for c in text.chars() {
            app.push_char(c);
        }
    }

    #[tokio::test]
    async fn test_submit_clears_draft_and_rejection_keeps_it() {
        let (mut app, _rx) = app();

        type_text(&mut app, "Hello");
        app.submit();
        assert!(app.input.is_empty());
        assert_eq!(app.status(), ConnectionStatus::Connecting);

        // Input is locked while the first question is queued.
        type_text(&mut app, "ignored");
        assert!(app.input.is_empty());

        app.input = "second".to_string();
        app.submit();
        assert_eq!(app.input, "second");
        assert!(matches!(
            app.toasts.back().map(|t| &t.notice),
            Some(Notice::StillConnecting)
        ));
    }

    async fn go_live(app: &mut App<MockConnector>, rx: &mut EventReceiver, question: &str) {
        type_text(app, question);
        app.submit();

        while app.status() != ConnectionStatus::Live
            || app.controller.chat_view().messages.len() < 2
        {
            let envelope = rx.recv().await.unwrap();
            app.on_envelope(envelope);
        }
    }

    #[tokio::test]
    async fn test_answer_arrives_through_envelopes() {
        let (mut app, mut rx) = app();

        go_live(&mut app, &mut rx, "Where is the office?").await;

        let messages = app.controller.chat_view().messages;
        assert_eq!(messages[0].text, "Where is the office?");
        assert!(messages[1].text.contains("simulated answer"));
        assert!(app
            .controller
            .live_session_id()
            .unwrap()
            .starts_with("mock-conversation-"));
    }

    #[tokio::test]
    async fn test_browsing_history_clears_draft() {
        let (mut app, mut rx) = app();

        // The latest session is on screen at start, and without a live
        // conversation the input stays usable.
        assert_eq!(app.controller.viewed_session_id(), Some("history-infos-quebec"));
        type_text(&mut app, "draft");
        app.select_next();
        assert_eq!(
            app.controller.viewed_session_id(),
            Some("history-ontario-services")
        );
        assert_eq!(app.input, "draft");
        app.jump_live();
        app.input.clear();

        go_live(&mut app, &mut rx, "Hello").await;
        let live = app.controller.live_session_id().unwrap().to_string();

        type_text(&mut app, "half typed");
        app.select_next();
        assert_eq!(app.controller.viewed_session_id(), Some("history-infos-quebec"));
        assert_eq!(app.controller.input_state(), InputState::ViewingHistory);
        assert!(app.input.is_empty());

        app.select_next();
        assert_eq!(
            app.controller.viewed_session_id(),
            Some("history-ontario-services")
        );
        app.select_next();
        assert_eq!(
            app.controller.viewed_session_id(),
            Some("history-ontario-services")
        );
        app.select_previous();
        assert_eq!(app.controller.viewed_session_id(), Some("history-infos-quebec"));

        app.jump_live();
        assert_eq!(app.controller.viewed_session_id(), Some(live.as_str()));
        assert!(app.controller.input_state().is_enabled());
    }

    #[tokio::test]
    async fn test_cycling_settings() {
        let (mut app, _rx) = app();

        app.cycle_region();
        assert_eq!(app.controller.region(), Region::West);
        assert_eq!(app.status(), ConnectionStatus::Connecting);

        app.cycle_language();
        assert_eq!(app.controller.language(), Language::Fr);
    }

    #[test]
    fn test_toasts_expire() {
        let (tx, _rx) = event_channel();
        let connector = MockConnector::new(MockConfig::default(), tx);
        let controller =
            Controller::new(connector, SessionStore::new(), ControllerSettings::default());
        let mut app = App::new(controller);

        app.toasts.push_back(Toast {
            notice: Notice::StillConnecting,
            shown_at: Instant::now() - TOAST_TTL - Duration::from_millis(1),
        });
        app.toasts.push_back(Toast {
            notice: Notice::StillConnecting,
            shown_at: Instant::now(),
        });
        app.on_tick();

        assert_eq!(app.toasts.len(), 1);
    }
}
