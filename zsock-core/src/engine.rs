//! The native engine boundary.
//!
//! Everything below this trait is a black box: context threads, transports,
//! queueing. Every primitive is non-blocking except [`Engine::poll`], and
//! native objects are referred to by opaque `Copy` handles the engine hands
//! out. An engine must tolerate stale handles by returning an error.

use bitflags::bitflags;
use bytes::Bytes;

use crate::error::EngineResult;
use crate::events::EventFlags;

#[cfg(unix)]
pub use std::os::fd::RawFd;
/// Raw OS descriptor.
#[cfg(not(unix))]
pub type RawFd = i32;

/// Resource temporarily unavailable.
pub const EAGAIN: i32 = 11;
/// Interrupted system call.
pub const EINTR: i32 = 4;
/// Not a socket.
pub const ENOTSOCK: i32 = 88;
/// Invalid argument.
pub const EINVAL: i32 = 22;

/// Opaque native context reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawContext(pub usize);

/// Opaque native socket reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawSocket(pub usize);

/// Opaque native message buffer reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawMessage(pub usize);

bitflags! {
    /// Flags for the send and receive primitives.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SendFlags: i32 {
        /// `ZMQ_DONTWAIT`
        const DONT_WAIT = 1;
        /// `ZMQ_SNDMORE`
        const SEND_MORE = 2;
    }
}

/// Receive uses the same flag space; only `DONT_WAIT` is meaningful.
pub type RecvFlags = SendFlags;

/// Raw option payload as exchanged with the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// `int` option
    Int(i32),
    /// `int64_t` option
    Long(i64),
    /// `uint64_t` option
    ULong(u64),
    /// binary or string option
    Bytes(Vec<u8>),
}

/// Shape of a raw option value, used when reading an option back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKind {
    Int,
    Long,
    ULong,
    Bytes,
}

impl RawValue {
    /// The kind this value was encoded as.
    #[must_use]
    pub const fn kind(&self) -> RawKind {
        match self {
            Self::Int(_) => RawKind::Int,
            Self::Long(_) => RawKind::Long,
            Self::ULong(_) => RawKind::ULong,
            Self::Bytes(_) => RawKind::Bytes,
        }
    }
}

/// One native poll slot (`zmq_pollitem_t`).
///
/// Socket slots carry the socket and a zero descriptor; descriptor slots
/// carry no socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawPollItem {
    pub socket: Option<RawSocket>,
    pub fd: RawFd,
    pub events: EventFlags,
    pub revents: EventFlags,
}

impl RawPollItem {
    /// A socket slot.
    #[must_use]
    pub fn socket(socket: RawSocket, events: EventFlags) -> Self {
        Self {
            socket: Some(socket),
            fd: 0,
            events,
            revents: EventFlags::empty(),
        }
    }

    /// A raw descriptor slot.
    #[must_use]
    pub fn fd(fd: RawFd, events: EventFlags) -> Self {
        Self {
            socket: None,
            fd,
            events,
            revents: EventFlags::empty(),
        }
    }
}

/// Non-blocking native messaging engine.
///
/// Implemented by the libzmq backend and by the in-memory mock.
pub trait Engine: Send + Sync {
    /// Create a context with `io_threads` I/O threads.
    fn init(&self, io_threads: i32) -> EngineResult<RawContext>;

    /// Terminate a context.
    fn term(&self, ctx: RawContext) -> EngineResult<()>;

    /// Create a socket of the given wire type.
    fn socket(&self, ctx: RawContext, wire_type: i32) -> EngineResult<RawSocket>;

    /// Release a socket.
    fn close(&self, socket: RawSocket) -> EngineResult<()>;

    fn bind(&self, socket: RawSocket, endpoint: &str) -> EngineResult<()>;

    fn unbind(&self, socket: RawSocket, endpoint: &str) -> EngineResult<()>;

    fn connect(&self, socket: RawSocket, endpoint: &str) -> EngineResult<()>;

    fn disconnect(&self, socket: RawSocket, endpoint: &str) -> EngineResult<()>;

    /// Allocate an empty message buffer.
    fn msg_new(&self) -> EngineResult<RawMessage>;

    /// Allocate a message buffer holding a copy of `data`.
    fn msg_from(&self, data: &[u8]) -> EngineResult<RawMessage>;

    /// Contents of a message buffer.
    fn msg_data(&self, msg: RawMessage) -> EngineResult<Bytes>;

    /// Release a message buffer.
    fn msg_close(&self, msg: RawMessage) -> EngineResult<()>;

    /// Queue a message for sending.
    fn send(&self, socket: RawSocket, msg: RawMessage, flags: SendFlags) -> EngineResult<()>;

    /// Receive the next frame into `msg`.
    fn recv(&self, socket: RawSocket, msg: RawMessage, flags: RecvFlags) -> EngineResult<()>;

    fn setsockopt(&self, socket: RawSocket, id: i32, value: &RawValue) -> EngineResult<()>;

    fn getsockopt(&self, socket: RawSocket, id: i32, kind: RawKind) -> EngineResult<RawValue>;

    /// Block until a slot is ready or `timeout_ms` elapses (negative: forever).
    ///
    /// Fills in `revents` and returns the number of ready slots.
    fn poll(&self, items: &mut [RawPollItem], timeout_ms: i64) -> EngineResult<usize>;

    /// `(major, minor, patch)` of the engine.
    fn version(&self) -> (i32, i32, i32);
}
