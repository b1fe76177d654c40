//! Error handling for the collision search
//!
//! The search itself has only two non-success outcomes (exhaustion and
//! abandonment) and both are expected, recoverable results. Everything else
//! here belongs to the harness: configuration, I/O and worker plumbing.

use thiserror::Error;

/// Result type alias for collision search operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the collision search
#[derive(Error, Debug)]
pub enum Error {
    /// Every 32-bit counter was tried and none met the target
    #[error("No collision with {target} leading zero bits exists for any 32-bit counter")]
    Exhausted { target: u32 },

    /// The search was cancelled before a collision was found
    #[error("Search for {target} leading zero bits abandoned after {evaluations} evaluations")]
    Abandoned { target: u32, evaluations: u64 },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Search worker failed to run to completion
    #[error("Search task failed: {message}")]
    Task { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an exhaustion error
    pub fn exhausted(target: u32) -> Self {
        Self::Exhausted { target }
    }

    /// Create an abandonment error
    pub fn abandoned(target: u32, evaluations: u64) -> Self {
        Self::Abandoned {
            target,
            evaluations,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a task error
    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }

    /// Whether the caller can carry on, e.g. by lowering the target
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Exhausted { .. } | Error::Abandoned { .. })
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Exhausted { .. } => "exhausted",
            Error::Abandoned { .. } => "abandoned",
            Error::Config { .. } => "config",
            Error::Task { .. } => "task",
            Error::Json(_) => "json",
            Error::Yaml(_) => "yaml",
            Error::Io(_) => "io",
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::task(err.to_string())
    }
}
