//! Error types for outbound transport calls.
//!
//! Transport failures are handed back to the handler that made the call. The
//! dispatcher itself never retries them.

use thiserror::Error;

/// Errors that can occur when calling the messaging platform.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The platform rejected or failed to deliver the message.
    #[error("failed to send message: {0}")]
    SendFailed(String),

    /// The referenced channel or message does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// What was being looked up ("channel", "message", ...).
        kind: &'static str,
        /// The missing identifier.
        id: String,
    },

    /// The bot lacks the permission required for the call.
    #[error("missing permission: {0}")]
    Forbidden(String),

    /// The connection to the platform is gone.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// Any other platform error.
    #[error("transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// Creates a [`TransportError::SendFailed`].
    pub fn send_failed(msg: impl Into<String>) -> Self {
        Self::SendFailed(msg.into())
    }

    /// Creates a [`TransportError::NotFound`] for a message id.
    pub fn message_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "message",
            id: id.into(),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = TransportError::message_not_found("42");
        assert_eq!(err.to_string(), "message '42' not found");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: TransportError = io.into();
        assert!(matches!(err, TransportError::Other(_)));
    }
}
