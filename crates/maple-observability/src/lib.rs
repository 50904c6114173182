//! Maple Observability
//!
//! Structured logging shared by the Maple front ends.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::LoggingConfig;
pub use error::{ObservabilityError, Result};
pub use logging::{connection_span, conversation_span, LogManager};
