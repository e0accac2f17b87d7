//! libzmq error translation.

use zsock_core::error::EngineError;

/// Translate a libzmq error into the engine error space.
pub fn from_zmq(err: zmq::Error) -> EngineError {
    match err {
        zmq::Error::EAGAIN => EngineError::WouldBlock,
        zmq::Error::EINTR => EngineError::Interrupted,
        other => EngineError::native(other.to_raw(), other.message()),
    }
}

/// `?`-friendly conversion for libzmq results.
pub trait ZmqResultExt<T> {
    fn engine(self) -> Result<T, EngineError>;
}

impl<T> ZmqResultExt<T> for zmq::Result<T> {
    fn engine(self) -> Result<T, EngineError> {
        self.map_err(from_zmq)
    }
}
