//! # Maple Conversation
//!
//! The conversation lifecycle state machine behind the chat window.
//!
//! A [`Controller`] tracks two independent things: the *live* session, the
//! one conversation that owns the connection, and the *viewed* session,
//! whatever the user is reading. Input enablement and every other UI flag
//! are derived from those two plus the current [`Phase`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use maple_conversation::{Controller, ControllerSettings};
//! use maple_gateway::{event_channel, MockConfig, MockConnector};
//! use maple_session::SessionStore;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut rx) = event_channel();
//!     let connector = MockConnector::new(MockConfig::default(), tx);
//!     let mut controller =
//!         Controller::new(connector, SessionStore::new(), ControllerSettings::default());
//!
//!     controller.send_message("Hello").unwrap();
//!     while let Some(envelope) = rx.recv().await {
//!         controller.handle_envelope(envelope);
//!         if !controller.is_loading() {
//!             break;
//!         }
//!     }
//! }
//! ```

pub mod controller;
pub mod error;
pub mod i18n;
pub mod notice;
pub mod phase;
pub mod view;

pub use controller::{Controller, ControllerSettings, SendRejected};
pub use error::ConversationError;
pub use i18n::Strings;
pub use notice::{Notice, Severity};
pub use phase::{PendingQuestion, Phase};
pub use view::{format_history_time, format_message_time, ChatView, HistoryRow, InputState};
