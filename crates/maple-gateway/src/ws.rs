//! WebSocket connector
//!
//! Each connect attempt gets its own link task. The task owns the socket,
//! forwards outbound frames from a channel, and reports inbound frames and
//! the final close as events tagged with the link's handle.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use maple_core::{ClientRequest, Language, Region};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::connector::{
    ConnectionHandle, Connector, HandleSequence, LinkState, TransportError, TransportResult,
};
use crate::endpoint::validate_endpoint;
use crate::event::{EventSender, TransportEnvelope, TransportEvent};

/// Abnormal closure, reported when the socket drops without a close frame
const ABNORMAL_CLOSE: u16 = 1006;

/// WebSocket connector configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Upgrade endpoint (e.g., "ws://127.0.0.1:8000/ws")
    pub endpoint: String,
    /// How long a polite close waits for the server's close frame
    pub close_grace: Duration,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:8000/ws".to_string(),
            close_grace: Duration::from_millis(2000),
        }
    }
}

enum Outbound {
    Frame(String),
    Close,
}

struct Link {
    handle: ConnectionHandle,
    state: Arc<Mutex<LinkState>>,
    outbound: mpsc::UnboundedSender<Outbound>,
    task: JoinHandle<()>,
}

impl Link {
    fn state(&self) -> LinkState {
        *self.state.lock()
    }

    fn shutdown(self) {
        let mut state = self.state.lock();
        match *state {
            LinkState::Connecting => {
                // Nothing has been said on the wire yet; just drop the attempt.
                self.task.abort();
                *state = LinkState::Closed;
                debug!("{} aborted while connecting", self.handle);
            }
            LinkState::Open => {
                *state = LinkState::Closing;
                if self.outbound.send(Outbound::Close).is_err() {
                    self.task.abort();
                    *state = LinkState::Closed;
                }
                debug!("{} closing", self.handle);
            }
            LinkState::Closing | LinkState::Closed => {}
        }
    }
}

/// Real WebSocket connector
pub struct WsConnector {
    config: WsConfig,
    events: EventSender,
    handles: HandleSequence,
    current: Option<Link>,
}

impl std::fmt::Debug for WsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsConnector")
            .field("config", &self.config)
            .field("current", &self.current.as_ref().map(|l| (l.handle, l.state())))
            .finish()
    }
}

impl WsConnector {
    /// Create a connector that reports to `events`
    pub fn new(config: WsConfig, events: EventSender) -> TransportResult<Self> {
        validate_endpoint(&config.endpoint)?;
        Ok(Self {
            config,
            events,
            handles: HandleSequence::default(),
            current: None,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// State of the current link, if `handle` is current
    pub fn link_state(&self, handle: ConnectionHandle) -> Option<LinkState> {
        self.current
            .as_ref()
            .filter(|link| link.handle == handle)
            .map(Link::state)
    }
}

impl Connector for WsConnector {
    fn connect(&mut self, region: Region, language: Language) -> ConnectionHandle {
        if let Some(previous) = self.current.take() {
            previous.shutdown();
        }

        let handle = self.handles.next_handle();
        let state = Arc::new(Mutex::new(LinkState::Connecting));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        info!(
            "{} connecting to {} (region={}, language={})",
            handle, self.config.endpoint, region, language
        );

        let task = tokio::spawn(run_link(
            handle,
            self.config.clone(),
            state.clone(),
            outbound_rx,
            self.events.clone(),
        ));

        self.current = Some(Link {
            handle,
            state,
            outbound: outbound_tx,
            task,
        });
        handle
    }

    fn send(&mut self, handle: ConnectionHandle, request: &ClientRequest) -> TransportResult<()> {
        let link = self
            .current
            .as_ref()
            .filter(|link| link.handle == handle && link.state() == LinkState::Open)
            .ok_or(TransportError::NotConnected(handle))?;

        let json = request.to_json()?;
        link.outbound
            .send(Outbound::Frame(json))
            .map_err(|_| TransportError::NotConnected(handle))
    }

    fn close(&mut self, handle: ConnectionHandle) {
        match self.current.take() {
            Some(link) if link.handle == handle => link.shutdown(),
            other => {
                debug!("Ignoring close for stale handle {}", handle);
                self.current = other;
            }
        }
    }

    fn is_open(&self, handle: ConnectionHandle) -> bool {
        self.link_state(handle) == Some(LinkState::Open)
    }
}

impl Drop for WsConnector {
    fn drop(&mut self) {
        if let Some(link) = self.current.take() {
            link.shutdown();
        }
    }
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn open_stream(endpoint: &str) -> TransportResult<WsStream> {
    let (stream, _response) = connect_async(endpoint).await?;
    Ok(stream)
}

enum Ending {
    Local,
    Remote(Option<u16>),
    Broken(String),
}

async fn run_link(
    handle: ConnectionHandle,
    config: WsConfig,
    state: Arc<Mutex<LinkState>>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    events: EventSender,
) {
    let emit = |event: TransportEvent| {
        if events.send(TransportEnvelope::new(handle, event)).is_err() {
            debug!("{} event receiver dropped", handle);
        }
    };

    let ws_stream = match open_stream(&config.endpoint).await {
        Ok(ws_stream) => ws_stream,
        Err(e) => {
            warn!("{} failed to connect: {}", handle, e);
            *state.lock() = LinkState::Closed;
            emit(TransportEvent::ConnectionFailed {
                reason: e.to_string(),
            });
            return;
        }
    };

    {
        let mut state = state.lock();
        // A close requested during the handshake wins.
        if *state != LinkState::Connecting {
            return;
        }
        *state = LinkState::Open;
    }
    info!("{} connected", handle);

    let (mut sender, mut receiver) = ws_stream.split();

    let ending = loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(Outbound::Frame(json)) => {
                    if let Err(e) = sender.send(Message::Text(json)).await {
                        error!("{} failed to send: {}", handle, e);
                        break Ending::Broken(TransportError::from(e).to_string());
                    }
                }
                Some(Outbound::Close) | None => break Ending::Local,
            },

            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    debug!("{} received {} bytes", handle, text.len());
                    emit(TransportEvent::from_frame(&text));
                }
                Some(Ok(Message::Close(frame))) => {
                    break Ending::Remote(frame.map(|f| u16::from(f.code)));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => break Ending::Broken(TransportError::from(e).to_string()),
                None => break Ending::Broken("stream ended without a close frame".to_string()),
            },
        }
    };

    let (code, was_clean) = match ending {
        Ending::Local => {
            if let Ok(json) = ClientRequest::close().to_json() {
                if let Err(e) = sender.send(Message::Text(json)).await {
                    debug!("{} could not send close request: {}", handle, e);
                }
            }
            let frame = CloseFrame {
                code: CloseCode::Normal,
                reason: "".into(),
            };
            if let Err(e) = sender.send(Message::Close(Some(frame))).await {
                debug!("{} could not send close frame: {}", handle, e);
            }

            let acknowledged = tokio::time::timeout(config.close_grace, async {
                while let Some(Ok(frame)) = receiver.next().await {
                    if frame.is_close() {
                        return true;
                    }
                }
                false
            })
            .await
            .unwrap_or(false);

            if !acknowledged {
                debug!("{} peer did not acknowledge close", handle);
            }
            (Some(u16::from(CloseCode::Normal)), true)
        }
        Ending::Remote(code) => {
            // Flush the close reply tungstenite queued for us.
            if let Err(e) = sender.close().await {
                debug!("{} could not flush close reply: {}", handle, e);
            }
            info!("{} closed by server (code={:?})", handle, code);
            (code, true)
        }
        Ending::Broken(reason) => {
            warn!("{} connection lost: {}", handle, reason);
            (Some(ABNORMAL_CLOSE), false)
        }
    };

    *state.lock() = LinkState::Closed;
    emit(TransportEvent::ConnectionClosed { code, was_clean });
}
