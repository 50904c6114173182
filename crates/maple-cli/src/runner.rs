//! Drives a [`Controller`] outside of an event loop
//!
//! The CLI sends one question at a time and then pumps transport events
//! into the controller until it is no longer waiting on the network.

use std::time::Duration;

use anyhow::{bail, Result};
use maple_conversation::{Controller, Notice};
use maple_core::Message;
use maple_gateway::{Connector, EventReceiver, TransportEvent};
use tracing::debug;

/// Feed envelopes to `controller` until it stops loading
///
/// Returns the notices raised along the way.
pub async fn pump_until_settled<C: Connector>(
    controller: &mut Controller<C>,
    events: &mut EventReceiver,
    timeout: Duration,
) -> Result<Vec<Notice>> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut notices = controller.take_notices();

    while controller.is_loading() {
        let envelope = match tokio::time::timeout_at(deadline, events.recv()).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => bail!("Transport event channel closed"),
            Err(_) => bail!("No reply within {:?}", timeout),
        };
        controller.handle_envelope(envelope);
        notices.extend(controller.take_notices());
    }

    Ok(notices)
}

/// The bot reply ending the viewed session, if any
pub fn latest_answer<C: Connector>(controller: &Controller<C>) -> Option<&Message> {
    controller
        .viewed_session()
        .and_then(|session| session.last_message())
        .filter(|message| !message.is_user())
}

/// Shut the controller down and give the close handshake `grace` to finish
pub async fn close_politely<C: Connector>(
    controller: &mut Controller<C>,
    events: &mut EventReceiver,
    grace: Duration,
) {
    let open = controller.phase().handle().is_some();
    controller.shutdown();
    if !open {
        return;
    }

    let deadline = tokio::time::Instant::now() + grace;
    while let Ok(Some(envelope)) = tokio::time::timeout_at(deadline, events.recv()).await {
        if matches!(envelope.event, TransportEvent::ConnectionClosed { .. }) {
            debug!("{} closed", envelope.handle);
            break;
        }
    }
}
