//! Lifecycle phases of the live conversation slot

use maple_gateway::ConnectionHandle;
use maple_session::SessionId;

/// The single first question queued until a conversation is confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    pub text: String,
}

/// Where the live slot is in its lifecycle
///
/// The connection handle lives inside the phase, so there is never a handle
/// without a phase that explains it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// No live session and no connection
    #[default]
    Idle,
    /// A connect is outstanding
    Connecting {
        handle: ConnectionHandle,
        session_id: Option<SessionId>,
        pending: Option<PendingQuestion>,
    },
    /// Confirmed conversation, ready for a question
    Live {
        handle: ConnectionHandle,
        session_id: SessionId,
    },
    /// A question is on the wire
    AwaitingAnswer {
        handle: ConnectionHandle,
        session_id: SessionId,
    },
}

impl Phase {
    pub fn handle(&self) -> Option<ConnectionHandle> {
        match self {
            Phase::Idle => None,
            Phase::Connecting { handle, .. }
            | Phase::Live { handle, .. }
            | Phase::AwaitingAnswer { handle, .. } => Some(*handle),
        }
    }

    /// Id of the live session, if one exists
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Phase::Idle => None,
            Phase::Connecting { session_id, .. } => session_id.as_deref(),
            Phase::Live { session_id, .. } | Phase::AwaitingAnswer { session_id, .. } => {
                Some(session_id)
            }
        }
    }

    pub fn pending(&self) -> Option<&PendingQuestion> {
        match self {
            Phase::Connecting { pending, .. } => pending.as_ref(),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Connecting { .. } => "connecting",
            Phase::Live { .. } => "live",
            Phase::AwaitingAnswer { .. } => "awaiting_answer",
        }
    }
}
