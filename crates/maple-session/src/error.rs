//! # Store Error Types

use thiserror::Error;

/// Session store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The targeted session is not in the store
    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    /// Another session already uses this id
    #[error("Session already exists: {id}")]
    SessionAlreadyExists { id: String },
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::SessionNotFound { id: id.into() }
    }

    pub fn already_exists(id: impl Into<String>) -> Self {
        Self::SessionAlreadyExists { id: id.into() }
    }
}

/// Store result type
pub type StoreResult<T> = Result<T, StoreError>;
