//! Maple Gateway - client side transport for chat conversations
//!
//! A [`Connector`] owns at most one live connection at a time and reports
//! everything that happens on it as [`TransportEnvelope`]s on a single
//! channel. Two implementations share that contract:
//!
//! - [`WsConnector`]: a real WebSocket client built on tokio-tungstenite
//! - [`MockConnector`]: a deterministic stand-in that answers locally

mod connector;
mod endpoint;
mod event;
mod mock;
mod ws;

pub use connector::{ConnectionHandle, Connector, HandleSequence, LinkState, TransportError, TransportResult};
pub use endpoint::{endpoint_from_origin, validate_endpoint, DEFAULT_WS_PATH};
pub use event::{event_channel, is_normal_closure, EventReceiver, EventSender, TransportEnvelope, TransportEvent};
pub use mock::{MockConfig, MockConnector};
pub use ws::{WsConfig, WsConnector};
