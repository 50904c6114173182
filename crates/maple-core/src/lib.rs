//! Maple Core - data model and wire protocol for the Maple chat client
//!
//! Everything here is plain data: regions, languages, messages and the JSON
//! frames exchanged with the chat backend. Session bookkeeping lives in
//! `maple-session`, the transport in `maple-gateway`.

pub mod protocol;
pub mod types;

pub use protocol::{ClientRequest, ErrorCode, ServerMessage};
pub use types::{
    derive_title, new_message_id, Language, Message, MessageId, ParseTagError, Region, Sender,
    TITLE_MAX_CHARS,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
