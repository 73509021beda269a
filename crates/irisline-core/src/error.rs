//! Shared error type across irisline crates.

use thiserror::Error;

/// Stable error codes (used by callers and tests instead of matching messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input to a command builder.
    InvalidArgument,
    /// Payload could not be decoded into a structured value.
    InvalidPayload,
    /// Topic or discriminator not present in a closed table.
    UnknownTopic,
    /// A required envelope field is missing.
    IncompleteMessage,
    /// Handler-level dispatch failure.
    Handler,
    /// Packet type nibble not understood.
    UnknownPacketType,
    /// Socket / broker failure.
    Transport,
    /// Invalid configuration.
    Config,
    /// Client was stopped.
    Stopped,
    /// Internal invariant broken.
    Internal,
}

impl ErrorKind {
    /// String representation used in logs and event payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::InvalidPayload => "INVALID_PAYLOAD",
            ErrorKind::UnknownTopic => "UNKNOWN_TOPIC",
            ErrorKind::IncompleteMessage => "INCOMPLETE_MESSAGE",
            ErrorKind::Handler => "HANDLER",
            ErrorKind::UnknownPacketType => "UNKNOWN_PACKET_TYPE",
            ErrorKind::Transport => "TRANSPORT",
            ErrorKind::Config => "CONFIG",
            ErrorKind::Stopped => "STOPPED",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PushError>;

/// Unified error type used by core and client.
#[derive(Debug, Error)]
pub enum PushError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("unknown topic: {0}")]
    UnknownTopic(String),
    #[error("incomplete message: {0}")]
    IncompleteMessage(String),
    #[error("handler error: {0}")]
    Handler(String),
    #[error("unknown packet type: {0}")]
    UnknownPacketType(u8),
    #[error("transport: {0}")]
    Transport(String),
    #[error("config: {0}")]
    Config(String),
    #[error("client stopped")]
    Stopped,
    #[error("internal: {0}")]
    Internal(String),
}

impl PushError {
    /// Map to a stable code.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PushError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            PushError::InvalidPayload(_) => ErrorKind::InvalidPayload,
            PushError::UnknownTopic(_) => ErrorKind::UnknownTopic,
            PushError::IncompleteMessage(_) => ErrorKind::IncompleteMessage,
            PushError::Handler(_) => ErrorKind::Handler,
            PushError::UnknownPacketType(_) => ErrorKind::UnknownPacketType,
            PushError::Transport(_) => ErrorKind::Transport,
            PushError::Config(_) => ErrorKind::Config,
            PushError::Stopped => ErrorKind::Stopped,
            PushError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Errors that tear down the session and go through the reconnect path.
    /// Everything else only affects the packet that caused it.
    pub fn is_transport(&self) -> bool {
        matches!(self, PushError::Transport(_))
    }

    /// Iris rejected the subscription because the server-side queue moved past
    /// (or before) our sequence id. The server only tells us in prose.
    pub fn is_iris_queue_error(&self) -> bool {
        match self {
            PushError::Handler(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("queue overflow") || msg.contains("queue underflow")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_errors_are_detected_by_substring() {
        let e = PushError::Handler(
            "Iris subscription failed (1): Queue Overflow, please resync".into(),
        );
        assert!(e.is_iris_queue_error());
        let e = PushError::Handler("Iris subscription failed (2): queue underflow".into());
        assert!(e.is_iris_queue_error());
        let e = PushError::Handler("Iris subscription failed (3): unauthorized".into());
        assert!(!e.is_iris_queue_error());
        assert!(!PushError::Transport("queue overflow".into()).is_iris_queue_error());
    }

    #[test]
    fn only_transport_errors_reconnect() {
        assert!(PushError::Transport("reset".into()).is_transport());
        assert!(!PushError::UnknownPacketType(15).is_transport());
        assert_eq!(PushError::UnknownPacketType(15).kind().as_str(), "UNKNOWN_PACKET_TYPE");
    }
}
