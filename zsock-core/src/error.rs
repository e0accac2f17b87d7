/// zsock Error Types
///
/// Two layers: [`EngineError`] is what a native engine primitive reports,
/// [`ZsockError`] is what the typed API surfaces to callers.

use std::io;
use thiserror::Error;

use crate::pattern::SocketType;

/// Failure reported by a native engine primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The non-blocking primitive could not complete without waiting (EAGAIN).
    #[error("resource temporarily unavailable")]
    WouldBlock,

    /// The primitive was interrupted by a signal (EINTR).
    #[error("interrupted system call")]
    Interrupted,

    /// Any other engine failure, with its errno and diagnostic.
    #[error("{message} (errno {code})")]
    Native { code: i32, message: String },
}

impl EngineError {
    /// Create a native error from an errno and diagnostic.
    pub fn native(code: i32, message: impl Into<String>) -> Self {
        Self::Native {
            code,
            message: message.into(),
        }
    }

    /// Would-block and interrupted are recovered locally by retrying.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::WouldBlock | Self::Interrupted)
    }

    /// The errno carried by this error.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::WouldBlock => crate::engine::EAGAIN,
            Self::Interrupted => crate::engine::EINTR,
            Self::Native { code, .. } => *code,
        }
    }
}

/// Result of a raw engine primitive.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Main error type for zsock operations
#[derive(Error, Debug)]
pub enum ZsockError {
    /// Creating, closing or using an already-closed resource failed
    #[error("{op}: {reason}")]
    Resource { op: &'static str, reason: String },

    /// A non-blocking primitive failed for a reason other than would-block
    #[error("{op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: EngineError,
    },

    /// A pattern-incompatible operation was attempted
    #[error("{op}: operation not supported for {pattern} sockets")]
    Unsupported {
        op: &'static str,
        pattern: SocketType,
    },

    /// A raw option value did not match the option's declared kind
    #[error("option codec: {0}")]
    Codec(String),

    /// Waiting for descriptor readiness failed
    #[error("readiness wait failed: {0}")]
    Readiness(#[from] io::Error),
}

/// Result type alias for zsock operations
pub type Result<T> = std::result::Result<T, ZsockError>;

impl ZsockError {
    /// Create a resource error for `op`.
    pub fn resource(op: &'static str, reason: impl Into<String>) -> Self {
        Self::Resource {
            op,
            reason: reason.into(),
        }
    }

    /// The error every operation reports after the handle was released.
    pub fn closed(op: &'static str) -> Self {
        Self::resource(op, "use of closed socket")
    }

    /// Attach the failing operation's name to an engine error.
    pub fn io(op: &'static str, source: EngineError) -> Self {
        Self::Io { op, source }
    }

    /// Create an unsupported-operation error.
    pub fn unsupported(op: &'static str, pattern: SocketType) -> Self {
        Self::Unsupported { op, pattern }
    }

    /// Create a codec error.
    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    /// Name of the operation that failed, when known.
    #[must_use]
    pub fn op(&self) -> Option<&'static str> {
        match self {
            Self::Resource { op, .. } | Self::Io { op, .. } | Self::Unsupported { op, .. } => {
                Some(op)
            }
            Self::Codec(_) | Self::Readiness(_) => None,
        }
    }

    /// Check if this is a use-of-closed-resource or allocation error
    #[must_use]
    pub const fn is_resource_error(&self) -> bool {
        matches!(self, Self::Resource { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(EngineError::WouldBlock.is_transient());
        assert!(EngineError::Interrupted.is_transient());
        assert!(!EngineError::native(22, "Invalid argument").is_transient());
    }

    #[test]
    fn test_error_carries_operation() {
        let err = ZsockError::io("bind", EngineError::native(97, "Address family not supported"));
        assert_eq!(err.op(), Some("bind"));
        assert_eq!(
            err.to_string(),
            "bind: Address family not supported (errno 97)"
        );

        let err = ZsockError::closed("send");
        assert!(err.is_resource_error());
        assert_eq!(err.to_string(), "send: use of closed socket");
    }

    #[test]
    fn test_unsupported_display() {
        let err = ZsockError::unsupported("subscribe", SocketType::Req);
        assert_eq!(
            err.to_string(),
            "subscribe: operation not supported for REQ sockets"
        );
    }
}
