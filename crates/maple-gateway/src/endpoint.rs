//! Endpoint helpers
//!
//! The chat backend exposes a single upgrade endpoint on the page's own
//! origin; the WebSocket scheme mirrors the origin's transport security.

use crate::connector::{TransportError, TransportResult};

/// Path of the upgrade endpoint
pub const DEFAULT_WS_PATH: &str = "/ws";

/// Derive the WebSocket endpoint for an origin such as `https://host:port`
pub fn endpoint_from_origin(origin: &str) -> TransportResult<String> {
    let origin = origin.trim().trim_end_matches('/');
    let (scheme, rest) = origin
        .split_once("://")
        .ok_or_else(|| TransportError::InvalidEndpoint(origin.to_string()))?;

    let ws_scheme = match scheme.to_ascii_lowercase().as_str() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        _ => return Err(TransportError::InvalidEndpoint(origin.to_string())),
    };

    if rest.is_empty() {
        return Err(TransportError::InvalidEndpoint(origin.to_string()));
    }

    Ok(format!("{}://{}{}", ws_scheme, rest, DEFAULT_WS_PATH))
}

/// Check that an endpoint is a ws:// or wss:// URL with a host
pub fn validate_endpoint(endpoint: &str) -> TransportResult<()> {
    let valid = ["ws://", "wss://"].iter().any(|scheme| {
        endpoint
            .strip_prefix(scheme)
            .map(|rest| !rest.is_empty() && !rest.starts_with('/'))
            .unwrap_or(false)
    });

    if valid {
        Ok(())
    } else {
        Err(TransportError::InvalidEndpoint(endpoint.to_string()))
    }
}
