//! Observability errors

/// Observability error type
#[derive(Debug, thiserror::Error, Clone)]
pub enum ObservabilityError {
    /// Bad configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// The subscriber could not be built or updated
    #[error("Logging error: {message}")]
    Logging {
        /// What failed
        message: String,
    },

    /// Log file or directory problem
    #[error("IO error: {message}")]
    Io {
        /// What failed
        message: String,
    },
}

impl ObservabilityError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a logging error
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    /// Create an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Error category
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Logging { .. } => "logging",
            Self::Io { .. } => "io",
        }
    }
}

impl From<std::io::Error> for ObservabilityError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

/// Observability result type
pub type Result<T> = std::result::Result<T, ObservabilityError>;
