//! Error types for the mode state machine.

use thiserror::Error;

/// Message returned when a client tries to start grind mode outside chill mode
pub const PRECONDITION_CHILL_REQUIRED: &str =
    "can only enable grind mode while currently in chill mode";

#[derive(Error, Debug)]
pub enum StateError {
    /// Malformed admin patch or client request
    #[error("{0}")]
    Validation(String),

    /// Operation not allowed in the current mode
    #[error("{0}")]
    Precondition(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StateError {
    pub fn validation(message: impl Into<String>) -> Self {
        StateError::Validation(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        StateError::Precondition(message.into())
    }

    /// True for errors caused by the caller's input rather than the service
    pub fn is_client_error(&self) -> bool {
        matches!(self, StateError::Validation(_) | StateError::Precondition(_))
    }
}
