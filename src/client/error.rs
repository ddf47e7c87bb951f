// Error taxonomy for session operations. Every submit/query call resolves
// to a response, one of these errors, or cancellation by the caller.

use crate::codec::CodecError;
use crate::datatypes::{CommandId, CommandStatus};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The session is not currently bound; the supervisor may be mid
    /// reconnect. Watch the status stream and retry.
    #[error("session is not bound")]
    NotConnected,

    /// No response arrived within the configured response timeout. The
    /// connection itself is still considered healthy.
    #[error("timed out waiting for response")]
    Timeout,

    /// The connection dropped while the request was in flight.
    #[error("connection lost while waiting for response")]
    Disconnected,

    /// The session was closed while the request was in flight.
    #[error("session closed")]
    Closed,

    /// The SMSC answered with a non-zero command_status, or generic_nacked
    /// our sequence number.
    #[error("SMSC rejected request: {0}")]
    Protocol(CommandStatus),

    /// A registered sequence number came back with the wrong response
    /// command id.
    #[error("response command mismatch: expected {expected:?}, got {actual:?}")]
    ResponseMismatch {
        expected: CommandId,
        actual: CommandId,
    },

    /// The message would need more than 255 concatenated parts.
    #[error("message would exceed 255 segments")]
    MessageTooLong,

    /// The message cannot be submitted through this operation.
    #[error("invalid message: {0}")]
    InvalidMessage(&'static str),

    /// Wire-level encode/decode failure.
    #[error("codec error: {0}")]
    Wire(#[from] CodecError),

    /// Socket-level failure.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl SessionError {
    /// Whether retrying the same operation later can succeed without
    /// operator intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::NotConnected
            | SessionError::Timeout
            | SessionError::Disconnected
            | SessionError::Io(_) => true,
            SessionError::Protocol(status) => status.is_transient(),
            _ => false,
        }
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability() {
        assert!(SessionError::Timeout.is_retryable());
        assert!(SessionError::NotConnected.is_retryable());
        assert!(SessionError::Protocol(CommandStatus::Throttled).is_retryable());
        assert!(!SessionError::Protocol(CommandStatus::InvalidDstAddr).is_retryable());
        assert!(!SessionError::Closed.is_retryable());
        assert!(!SessionError::MessageTooLong.is_retryable());
    }
}
