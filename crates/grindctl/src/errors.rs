//! Error types and exit status for grindctl

use thiserror::Error;

/// Exit code for success
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when the server rejected the request (4xx)
pub const EXIT_REJECTED: i32 = 64;

/// Exit code when the server returns something that is not the expected JSON
pub const EXIT_INVALID_RESPONSE: i32 = 65;

/// Exit code when the server is unavailable/unreachable
pub const EXIT_SERVER_UNAVAILABLE: i32 = 70;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("server unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("error ({code}): {message}")]
    Rejected { code: u16, message: String },

    #[error("unexpected response from server: {0}")]
    InvalidResponse(String),

    #[error("invalid server URL: {0}")]
    InvalidServer(String),

    #[error("admin commands need a token (--token or GRIND_TOKEN)")]
    MissingToken,
}

impl ClientError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ClientError::Unreachable { .. } => EXIT_SERVER_UNAVAILABLE,
            ClientError::Rejected { code, .. } if *code < 500 => EXIT_REJECTED,
            ClientError::Rejected { .. } => EXIT_GENERAL_ERROR,
            ClientError::InvalidResponse(_) => EXIT_INVALID_RESPONSE,
            ClientError::InvalidServer(_) => EXIT_GENERAL_ERROR,
            ClientError::MissingToken => EXIT_REJECTED,
        }
    }
}
