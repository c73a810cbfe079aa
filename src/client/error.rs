// src/client/error.rs

use std::fmt;

/// Errors surfaced by the API client and the session state machine.
#[derive(Debug)]
pub enum ClientError {
    /// Transport or body decoding failure.
    Http(reqwest::Error),

    /// The server answered with a non-success status.
    Status { status: u16, message: String },

    InvalidUrl(url::ParseError),

    /// The request did not finish within the configured bound.
    Timeout,

    /// The session was torn down while the request was in flight.
    Cancelled,

    /// Local identity storage could not be read or written.
    Storage(String),

    /// The operation is not allowed in the current state.
    InvalidState(String),
}

impl ClientError {
    /// Worth repeating for an idempotent read: connection problems,
    /// timeouts and 5xx answers.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ClientError::Status { status, .. } => *status >= 500,
            ClientError::Timeout => true,
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status: 404, .. })
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::Http(e) => write!(f, "http error: {}", e),
            ClientError::Status { status, message } => {
                write!(f, "server returned {}: {}", status, message)
            }
            ClientError::InvalidUrl(e) => write!(f, "invalid url: {}", e),
            ClientError::Timeout => write!(f, "request timed out"),
            ClientError::Cancelled => write!(f, "request cancelled"),
            ClientError::Storage(msg) => write!(f, "identity storage: {}", msg),
            ClientError::InvalidState(msg) => write!(f, "invalid state: {}", msg),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Http(e) => Some(e),
            ClientError::InvalidUrl(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ClientError::Timeout;
        }
        ClientError::Http(err)
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err)
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}
