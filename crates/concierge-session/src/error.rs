//! # Session Error Types
//!
//! Errors raised by the remote query client and by the session engine.

use thiserror::Error;
use uuid::Uuid;

use crate::types::Lifecycle;

/// Failure to obtain a well-formed reply from the query service.
///
/// The engine treats every variant the same way: the turn is answered by the
/// fallback responder and connectivity drops to disconnected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS failure, timeout, ...
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("http error: {status} - {body}")]
    Status { status: u16, body: String },

    /// Body was not the expected JSON object
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The request could not be built (e.g. a token that is not a valid header value)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TransportError::Malformed(err.to_string())
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Engine invariant violations.
///
/// These never reach the end user; the adapter logs and drops them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A completion arrived for a session that has since been discarded
    #[error("stale completion for discarded session: {id}")]
    StaleSession { id: Uuid },

    /// A completion arrived while the session was in an unexpected lifecycle state
    #[error("invalid session state: {id}, current: {current}, expected: {expected}")]
    InvalidSessionState {
        id: Uuid,
        current: Lifecycle,
        expected: Lifecycle,
    },
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "http error: 503 - unavailable");

        let err = TransportError::network("connection refused");
        assert_eq!(err.to_string(), "network error: connection refused");
    }

    #[test]
    fn test_session_error_display() {
        let id = Uuid::new_v4();
        let err = SessionError::InvalidSessionState {
            id,
            current: Lifecycle::Ready,
            expected: Lifecycle::Sending,
        };
        assert_eq!(
            err.to_string(),
            format!("invalid session state: {}, current: ready, expected: sending", id)
        );

        let err = SessionError::StaleSession { id };
        assert!(err.to_string().contains(&id.to_string()));
    }
}
