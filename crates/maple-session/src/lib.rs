//! # Maple Session Store
//!
//! In-memory, ordered collection of chat sessions for a single client.
//!
//! - Sessions are sorted by start time, newest first, after every mutation
//! - Messages are append-only; nothing outside the store can push or edit them
//! - A temporary session id can be rewritten in place to the server's
//!   conversation id without ever having both ids present
//!
//! Nothing is persisted: a reload starts again from the seeded history.
//!
//! ```rust,no_run
//! use maple_core::{Language, Message, Region};
//! use maple_session::SessionStore;
//!
//! let mut store = SessionStore::new();
//! store.create_session("tmp-1", Region::Ontario, Language::En, Message::user("Hello"))?;
//! store.rewrite_session_id("tmp-1", "c1", Region::Ontario, Language::En)?;
//! assert_eq!(store.by_id("c1").unwrap().messages().len(), 1);
//! # Ok::<(), maple_session::StoreError>(())
//! ```

pub mod error;
pub mod seed;
pub mod store;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use seed::sample_history;
pub use store::SessionStore;
pub use types::{new_temp_session_id, Session, SessionId, TEMP_ID_PREFIX, UNTITLED};
