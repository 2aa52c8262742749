//! The `error` module defines the error type shared by every part of the talker.
//!
//! Library code propagates `TalkerError` with `?`; only the binary turns an
//! error into a process exit code.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TalkerError>;

#[derive(Debug, Error)]
pub enum TalkerError {
    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// A node, namespace or topic name is not valid.
    #[error("invalid {kind} name '{name}': {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: &'static str,
    },

    /// The middleware context could not be brought up. Always fatal.
    #[error("middleware initialization failed: {0}")]
    Init(String),

    /// A frame could not be delivered to the middleware.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The context backing a node or publisher was already shut down.
    #[error("middleware context has been shut down")]
    ContextShutdown,
}

impl From<config::ConfigError> for TalkerError {
    fn from(err: config::ConfigError) -> Self {
        TalkerError::Config(err.to_string())
    }
}

impl From<tungstenite::Error> for TalkerError {
    fn from(err: tungstenite::Error) -> Self {
        TalkerError::Transport(err.to_string())
    }
}

impl TalkerError {
    /// Whether the error should stop the publishing loop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TalkerError::ContextShutdown | TalkerError::Init(_))
    }
}
