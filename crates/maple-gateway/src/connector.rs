//! Connector contract
//!
//! Handles are cheap identifiers for a single connect attempt. Only the most
//! recent handle is authoritative; the controller compares handles to throw
//! away events from superseded connections.

use maple_core::{ClientRequest, Language, Region};

/// Identifies one connect attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionHandle(u64);

impl ConnectionHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Monotonic handle allocator, one per connector
#[derive(Debug, Default)]
pub struct HandleSequence {
    last: u64,
}

impl HandleSequence {
    pub fn next_handle(&mut self) -> ConnectionHandle {
        self.last += 1;
        ConnectionHandle(self.last)
    }
}

/// Lifecycle of a single link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Owner of zero or one outbound real-time connection
///
/// Implementations must be used from within a Tokio runtime: I/O happens on
/// spawned tasks and results come back as events, never as return values.
pub trait Connector {
    /// Close any existing connection, then start a new one
    fn connect(&mut self, region: Region, language: Language) -> ConnectionHandle;

    /// Transmit a request on an open connection
    fn send(&mut self, handle: ConnectionHandle, request: &ClientRequest) -> TransportResult<()>;

    /// Politely close the connection if open; no-op for stale or closed handles
    fn close(&mut self, handle: ConnectionHandle);

    /// Whether `handle` is the current connection and it is open
    fn is_open(&self, handle: ConnectionHandle) -> bool;
}

impl<C: Connector + ?Sized> Connector for Box<C> {
    fn connect(&mut self, region: Region, language: Language) -> ConnectionHandle {
        (**self).connect(region, language)
    }

    fn send(&mut self, handle: ConnectionHandle, request: &ClientRequest) -> TransportResult<()> {
        (**self).send(handle, request)
    }

    fn close(&mut self, handle: ConnectionHandle) {
        (**self).close(handle)
    }

    fn is_open(&self, handle: ConnectionHandle) -> bool {
        (**self).is_open(handle)
    }
}

/// Transport errors
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Not connected: {0}")]
    NotConnected(ConnectionHandle),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_monotonic() {
        let mut seq = HandleSequence::default();
        let a = seq.next_handle();
        let b = seq.next_handle();
        assert!(b > a);
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "conn-1");
    }
}
