//! Socket options and their raw codec.
//!
//! [`SocketOption`] is the typed value callers pass to `set_option`; the codec
//! turns it into the `(id, RawValue)` pair the engine's `setsockopt` expects,
//! and turns a raw `getsockopt` result back into a typed value.
//!
//! Read-only options (`Events`, `ReceiveMore`, `FileDescriptor`, `Type`,
//! `LastEndpoint`) cannot be set on the engine. Setting one is a silent no-op:
//! [`SocketOption::encode`] returns `Ok(None)` and nothing reaches the engine.
//!
//! [`SocketOptions`] is the configuration builder applied when a socket is
//! created.

use bytes::Bytes;
use std::time::Duration;

use crate::engine::{RawFd, RawKind, RawValue};
use crate::error::{Result, ZsockError};
use crate::events::PollEvent;
use crate::pattern::SocketType;

/// Engine option identifiers (libzmq 3.x numbering).
pub mod id {
    pub const AFFINITY: i32 = 4;
    pub const IDENTITY: i32 = 5;
    pub const SUBSCRIBE: i32 = 6;
    pub const UNSUBSCRIBE: i32 = 7;
    pub const RATE: i32 = 8;
    pub const RECOVERY_IVL: i32 = 9;
    pub const SNDBUF: i32 = 11;
    pub const RCVBUF: i32 = 12;
    pub const RCVMORE: i32 = 13;
    pub const FD: i32 = 14;
    pub const EVENTS: i32 = 15;
    pub const TYPE: i32 = 16;
    pub const LINGER: i32 = 17;
    pub const RECONNECT_IVL: i32 = 18;
    pub const BACKLOG: i32 = 19;
    pub const RECONNECT_IVL_MAX: i32 = 21;
    pub const MAXMSGSIZE: i32 = 22;
    pub const SNDHWM: i32 = 23;
    pub const RCVHWM: i32 = 24;
    pub const MULTICAST_HOPS: i32 = 25;
    pub const RCVTIMEO: i32 = 27;
    pub const SNDTIMEO: i32 = 28;
    pub const IPV4ONLY: i32 = 31;
    pub const LAST_ENDPOINT: i32 = 32;
    pub const TCP_KEEPALIVE: i32 = 34;
}

/// A typed socket option value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketOption {
    /// I/O thread affinity bitmask (ZMQ_AFFINITY)
    Affinity(u64),
    /// Maximum length of the pending connection queue (ZMQ_BACKLOG)
    Backlog(i32),
    /// Current readiness, read-only (ZMQ_EVENTS)
    Events(PollEvent),
    /// Descriptor signalling readiness, read-only (ZMQ_FD)
    FileDescriptor(RawFd),
    /// Socket identity (ZMQ_IDENTITY)
    Identity(Bytes),
    /// Restrict to IPv4 (ZMQ_IPV4ONLY)
    Ipv4Only(bool),
    /// Last bound endpoint, read-only (ZMQ_LAST_ENDPOINT)
    LastEndpoint(String),
    /// Linger period in milliseconds, -1 infinite (ZMQ_LINGER)
    Linger(i32),
    /// Maximum inbound message size, -1 unlimited (ZMQ_MAXMSGSIZE)
    MaxMessageSize(i64),
    /// Multicast hop limit (ZMQ_MULTICAST_HOPS)
    MulticastHops(i32),
    /// Multicast data rate in kbit/s (ZMQ_RATE)
    Rate(i32),
    /// Kernel receive buffer size (ZMQ_RCVBUF)
    ReceiveBuffer(i32),
    /// Inbound high water mark (ZMQ_RCVHWM)
    ReceiveHighWm(i32),
    /// More frames of the current message follow, read-only (ZMQ_RCVMORE)
    ReceiveMore(bool),
    /// Receive timeout in milliseconds, -1 infinite (ZMQ_RCVTIMEO)
    ReceiveTimeout(i32),
    /// Reconnection interval in milliseconds (ZMQ_RECONNECT_IVL)
    ReconnectIvl(i32),
    /// Maximum reconnection interval in milliseconds (ZMQ_RECONNECT_IVL_MAX)
    ReconnectIvlMax(i32),
    /// Multicast recovery interval in milliseconds (ZMQ_RECOVERY_IVL)
    RecoveryIvl(i32),
    /// Kernel send buffer size (ZMQ_SNDBUF)
    SendBuffer(i32),
    /// Outbound high water mark (ZMQ_SNDHWM)
    SendHighWm(i32),
    /// Send timeout in milliseconds, -1 infinite (ZMQ_SNDTIMEO)
    SendTimeout(i32),
    /// Add a subscription prefix, write-only (ZMQ_SUBSCRIBE)
    Subscribe(Bytes),
    /// Remove a subscription prefix, write-only (ZMQ_UNSUBSCRIBE)
    Unsubscribe(Bytes),
    /// Override SO_KEEPALIVE, -1 OS default (ZMQ_TCP_KEEPALIVE)
    TcpKeepAlive(i32),
    /// Socket type, read-only (ZMQ_TYPE)
    Type(SocketType),
}

/// Option names, for reading an option back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionName {
    Affinity,
    Backlog,
    Events,
    FileDescriptor,
    Identity,
    Ipv4Only,
    LastEndpoint,
    Linger,
    MaxMessageSize,
    MulticastHops,
    Rate,
    ReceiveBuffer,
    ReceiveHighWm,
    ReceiveMore,
    ReceiveTimeout,
    ReconnectIvl,
    ReconnectIvlMax,
    RecoveryIvl,
    SendBuffer,
    SendHighWm,
    SendTimeout,
    Subscribe,
    Unsubscribe,
    TcpKeepAlive,
    Type,
}

/// Which directions the engine supports for an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

impl OptionName {
    /// Engine option identifier.
    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Affinity => id::AFFINITY,
            Self::Backlog => id::BACKLOG,
            Self::Events => id::EVENTS,
            Self::FileDescriptor => id::FD,
            Self::Identity => id::IDENTITY,
            Self::Ipv4Only => id::IPV4ONLY,
            Self::LastEndpoint => id::LAST_ENDPOINT,
            Self::Linger => id::LINGER,
            Self::MaxMessageSize => id::MAXMSGSIZE,
            Self::MulticastHops => id::MULTICAST_HOPS,
            Self::Rate => id::RATE,
            Self::ReceiveBuffer => id::RCVBUF,
            Self::ReceiveHighWm => id::RCVHWM,
            Self::ReceiveMore => id::RCVMORE,
            Self::ReceiveTimeout => id::RCVTIMEO,
            Self::ReconnectIvl => id::RECONNECT_IVL,
            Self::ReconnectIvlMax => id::RECONNECT_IVL_MAX,
            Self::RecoveryIvl => id::RECOVERY_IVL,
            Self::SendBuffer => id::SNDBUF,
            Self::SendHighWm => id::SNDHWM,
            Self::SendTimeout => id::SNDTIMEO,
            Self::Subscribe => id::SUBSCRIBE,
            Self::Unsubscribe => id::UNSUBSCRIBE,
            Self::TcpKeepAlive => id::TCP_KEEPALIVE,
            Self::Type => id::TYPE,
        }
    }

    /// Raw shape of the option's value.
    #[must_use]
    pub const fn kind(self) -> RawKind {
        match self {
            Self::Affinity => RawKind::ULong,
            Self::MaxMessageSize => RawKind::Long,
            Self::Identity | Self::LastEndpoint | Self::Subscribe | Self::Unsubscribe => {
                RawKind::Bytes
            }
            _ => RawKind::Int,
        }
    }

    #[must_use]
    pub const fn access(self) -> Access {
        match self {
            Self::Events
            | Self::FileDescriptor
            | Self::LastEndpoint
            | Self::ReceiveMore
            | Self::Type => Access::ReadOnly,
            Self::Subscribe | Self::Unsubscribe => Access::WriteOnly,
            _ => Access::ReadWrite,
        }
    }

    /// Decode a raw engine value into a typed option.
    pub fn decode(self, raw: RawValue) -> Result<SocketOption> {
        let opt = match (self, raw) {
            (Self::Affinity, RawValue::ULong(v)) => SocketOption::Affinity(v),
            (Self::MaxMessageSize, RawValue::Long(v)) => SocketOption::MaxMessageSize(v),
            (Self::Identity, RawValue::Bytes(v)) => SocketOption::Identity(Bytes::from(v)),
            (Self::LastEndpoint, RawValue::Bytes(mut v)) => {
                // the engine reports a NUL-terminated string
                if v.last() == Some(&0) {
                    v.pop();
                }
                let endpoint = String::from_utf8(v)
                    .map_err(|e| ZsockError::codec(format!("last endpoint: {e}")))?;
                SocketOption::LastEndpoint(endpoint)
            }
            (Self::Subscribe | Self::Unsubscribe, _) => {
                return Err(ZsockError::codec(format!("{self:?} is write-only")));
            }
            (name, RawValue::Int(v)) => decode_int(name, v)?,
            (name, raw) => {
                return Err(ZsockError::codec(format!(
                    "{name:?} expects {:?}, engine returned {:?}",
                    name.kind(),
                    raw.kind()
                )));
            }
        };
        Ok(opt)
    }
}

fn decode_int(name: OptionName, v: i32) -> Result<SocketOption> {
    Ok(match name {
        OptionName::Backlog => SocketOption::Backlog(v),
        OptionName::Events => SocketOption::Events(PollEvent::from_bits(v as i16)),
        OptionName::FileDescriptor => SocketOption::FileDescriptor(v as RawFd),
        OptionName::Ipv4Only => SocketOption::Ipv4Only(v != 0),
        OptionName::Linger => SocketOption::Linger(v),
        OptionName::MulticastHops => SocketOption::MulticastHops(v),
        OptionName::Rate => SocketOption::Rate(v),
        OptionName::ReceiveBuffer => SocketOption::ReceiveBuffer(v),
        OptionName::ReceiveHighWm => SocketOption::ReceiveHighWm(v),
        OptionName::ReceiveMore => SocketOption::ReceiveMore(v != 0),
        OptionName::ReceiveTimeout => SocketOption::ReceiveTimeout(v),
        OptionName::ReconnectIvl => SocketOption::ReconnectIvl(v),
        OptionName::ReconnectIvlMax => SocketOption::ReconnectIvlMax(v),
        OptionName::RecoveryIvl => SocketOption::RecoveryIvl(v),
        OptionName::SendBuffer => SocketOption::SendBuffer(v),
        OptionName::SendHighWm => SocketOption::SendHighWm(v),
        OptionName::SendTimeout => SocketOption::SendTimeout(v),
        OptionName::TcpKeepAlive => SocketOption::TcpKeepAlive(v),
        OptionName::Type => SocketOption::Type(
            SocketType::from_raw(v)
                .ok_or_else(|| ZsockError::codec(format!("unknown socket type {v}")))?,
        ),
        other => {
            return Err(ZsockError::codec(format!(
                "{other:?} expects {:?}, engine returned Int",
                other.kind()
            )))
        }
    })
}

impl SocketOption {
    /// The option's name.
    #[must_use]
    pub const fn name(&self) -> OptionName {
        match self {
            Self::Affinity(_) => OptionName::Affinity,
            Self::Backlog(_) => OptionName::Backlog,
            Self::Events(_) => OptionName::Events,
            Self::FileDescriptor(_) => OptionName::FileDescriptor,
            Self::Identity(_) => OptionName::Identity,
            Self::Ipv4Only(_) => OptionName::Ipv4Only,
            Self::LastEndpoint(_) => OptionName::LastEndpoint,
            Self::Linger(_) => OptionName::Linger,
            Self::MaxMessageSize(_) => OptionName::MaxMessageSize,
            Self::MulticastHops(_) => OptionName::MulticastHops,
            Self::Rate(_) => OptionName::Rate,
            Self::ReceiveBuffer(_) => OptionName::ReceiveBuffer,
            Self::ReceiveHighWm(_) => OptionName::ReceiveHighWm,
            Self::ReceiveMore(_) => OptionName::ReceiveMore,
            Self::ReceiveTimeout(_) => OptionName::ReceiveTimeout,
            Self::ReconnectIvl(_) => OptionName::ReconnectIvl,
            Self::ReconnectIvlMax(_) => OptionName::ReconnectIvlMax,
            Self::RecoveryIvl(_) => OptionName::RecoveryIvl,
            Self::SendBuffer(_) => OptionName::SendBuffer,
            Self::SendHighWm(_) => OptionName::SendHighWm,
            Self::SendTimeout(_) => OptionName::SendTimeout,
            Self::Subscribe(_) => OptionName::Subscribe,
            Self::Unsubscribe(_) => OptionName::Unsubscribe,
            Self::TcpKeepAlive(_) => OptionName::TcpKeepAlive,
            Self::Type(_) => OptionName::Type,
        }
    }

    /// Encode for the engine's `setsockopt`.
    ///
    /// Returns `Ok(None)` for read-only options, which are not passed on.
    pub fn encode(&self) -> Result<Option<(i32, RawValue)>> {
        let raw = match self {
            Self::Events(_)
            | Self::FileDescriptor(_)
            | Self::LastEndpoint(_)
            | Self::ReceiveMore(_)
            | Self::Type(_) => return Ok(None),
            Self::Affinity(v) => RawValue::ULong(*v),
            Self::MaxMessageSize(v) => RawValue::Long(*v),
            Self::Identity(v) => {
                SocketOptions::validate_identity(v)?;
                RawValue::Bytes(v.to_vec())
            }
            Self::Subscribe(v) | Self::Unsubscribe(v) => RawValue::Bytes(v.to_vec()),
            Self::Ipv4Only(v) => RawValue::Int(i32::from(*v)),
            Self::Backlog(v)
            | Self::Linger(v)
            | Self::MulticastHops(v)
            | Self::Rate(v)
            | Self::ReceiveBuffer(v)
            | Self::ReceiveHighWm(v)
            | Self::ReceiveTimeout(v)
            | Self::ReconnectIvl(v)
            | Self::ReconnectIvlMax(v)
            | Self::RecoveryIvl(v)
            | Self::SendBuffer(v)
            | Self::SendHighWm(v)
            | Self::SendTimeout(v)
            | Self::TcpKeepAlive(v) => RawValue::Int(*v),
        };
        Ok(Some((self.name().id(), raw)))
    }
}

/// Context configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOptions {
    /// Number of engine I/O threads.
    pub io_threads: i32,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self { io_threads: 1 }
    }
}

impl ContextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of I/O threads.
    pub fn with_io_threads(mut self, io_threads: i32) -> Self {
        self.io_threads = io_threads;
        self
    }
}

/// Socket configuration applied right after creation.
///
/// Unset fields leave the engine default in place.
///
/// # Examples
///
/// ```
/// use zsock_core::options::SocketOptions;
/// use std::time::Duration;
///
/// let opts = SocketOptions::new()
///     .with_identity(bytes::Bytes::from_static(b"worker-01"))
///     .with_recv_timeout(Duration::from_secs(5))
///     .with_linger(Some(Duration::ZERO));
/// assert_eq!(opts.to_options().len(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SocketOptions {
    /// Socket identity (ZMQ_IDENTITY)
    pub identity: Option<Bytes>,

    /// Linger period (ZMQ_LINGER)
    ///
    /// - `Some(None)`: wait forever for pending messages
    /// - `Some(Some(d))`: wait up to `d`
    pub linger: Option<Option<Duration>>,

    /// Receive timeout (ZMQ_RCVTIMEO)
    ///
    /// The engine reports expiry as a hard error, which ends a receive's
    /// retry loop.
    pub recv_timeout: Option<Duration>,

    /// Send timeout (ZMQ_SNDTIMEO)
    pub send_timeout: Option<Duration>,

    /// High water mark for receiving (ZMQ_RCVHWM)
    pub recv_hwm: Option<i32>,

    /// High water mark for sending (ZMQ_SNDHWM)
    pub send_hwm: Option<i32>,

    /// Reconnect interval (ZMQ_RECONNECT_IVL)
    pub reconnect_ivl: Option<Duration>,

    /// Maximum reconnect interval (ZMQ_RECONNECT_IVL_MAX)
    pub reconnect_ivl_max: Option<Duration>,

    /// Listen backlog (ZMQ_BACKLOG)
    pub backlog: Option<i32>,

    /// Maximum inbound message size (ZMQ_MAXMSGSIZE)
    pub max_msg_size: Option<i64>,

    /// I/O thread affinity (ZMQ_AFFINITY)
    pub affinity: Option<u64>,

    /// Kernel buffer sizes (ZMQ_SNDBUF / ZMQ_RCVBUF)
    pub sndbuf: Option<i32>,
    pub rcvbuf: Option<i32>,

    /// IPv4-only mode (ZMQ_IPV4ONLY)
    pub ipv4_only: Option<bool>,

    /// TCP keepalive override (ZMQ_TCP_KEEPALIVE)
    pub tcp_keepalive: Option<i32>,
}

fn millis(d: Duration) -> i32 {
    i32::try_from(d.as_millis()).unwrap_or(i32::MAX)
}

impl SocketOptions {
    /// Create new socket options leaving every engine default untouched.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set socket identity.
    ///
    /// # Examples
    ///
    /// ```
    /// use zsock_core::options::SocketOptions;
    /// use bytes::Bytes;
    ///
    /// let opts = SocketOptions::new().with_identity(Bytes::from_static(b"peer-1"));
    /// ```
    pub fn with_identity(mut self, id: Bytes) -> Self {
        self.identity = Some(id);
        self
    }

    /// Set linger; `None` lingers forever.
    pub fn with_linger(mut self, linger: Option<Duration>) -> Self {
        self.linger = Some(linger);
        self
    }

    /// Set receive timeout.
    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }

    /// Set send timeout.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Set receive high water mark.
    pub fn with_recv_hwm(mut self, hwm: i32) -> Self {
        self.recv_hwm = Some(hwm);
        self
    }

    /// Set send high water mark.
    pub fn with_send_hwm(mut self, hwm: i32) -> Self {
        self.send_hwm = Some(hwm);
        self
    }

    /// Set reconnection interval.
    pub fn with_reconnect_ivl(mut self, ivl: Duration) -> Self {
        self.reconnect_ivl = Some(ivl);
        self
    }

    /// Set maximum reconnection interval for exponential backoff.
    pub fn with_reconnect_ivl_max(mut self, max: Duration) -> Self {
        self.reconnect_ivl_max = Some(max);
        self
    }

    pub fn with_backlog(mut self, backlog: i32) -> Self {
        self.backlog = Some(backlog);
        self
    }

    /// Set maximum message size; `None` removes the limit.
    pub fn with_max_msg_size(mut self, size: Option<i64>) -> Self {
        self.max_msg_size = Some(size.unwrap_or(-1));
        self
    }

    pub fn with_affinity(mut self, mask: u64) -> Self {
        self.affinity = Some(mask);
        self
    }

    /// Set both kernel buffer sizes (convenience method).
    pub fn with_buffer_sizes(mut self, sndbuf: i32, rcvbuf: i32) -> Self {
        self.sndbuf = Some(sndbuf);
        self.rcvbuf = Some(rcvbuf);
        self
    }

    pub fn with_ipv4_only(mut self, enabled: bool) -> Self {
        self.ipv4_only = Some(enabled);
        self
    }

    pub fn with_tcp_keepalive(mut self, keepalive: i32) -> Self {
        self.tcp_keepalive = Some(keepalive);
        self
    }

    /// The options this configuration sets, in application order.
    pub fn to_options(&self) -> Vec<SocketOption> {
        let mut out = Vec::new();
        if let Some(id) = &self.identity {
            out.push(SocketOption::Identity(id.clone()));
        }
        if let Some(linger) = self.linger {
            out.push(SocketOption::Linger(linger.map_or(-1, millis)));
        }
        if let Some(t) = self.recv_timeout {
            out.push(SocketOption::ReceiveTimeout(millis(t)));
        }
        if let Some(t) = self.send_timeout {
            out.push(SocketOption::SendTimeout(millis(t)));
        }
        if let Some(hwm) = self.recv_hwm {
            out.push(SocketOption::ReceiveHighWm(hwm));
        }
        if let Some(hwm) = self.send_hwm {
            out.push(SocketOption::SendHighWm(hwm));
        }
        if let Some(ivl) = self.reconnect_ivl {
            out.push(SocketOption::ReconnectIvl(millis(ivl)));
        }
        if let Some(ivl) = self.reconnect_ivl_max {
            out.push(SocketOption::ReconnectIvlMax(millis(ivl)));
        }
        if let Some(backlog) = self.backlog {
            out.push(SocketOption::Backlog(backlog));
        }
        if let Some(size) = self.max_msg_size {
            out.push(SocketOption::MaxMessageSize(size));
        }
        if let Some(mask) = self.affinity {
            out.push(SocketOption::Affinity(mask));
        }
        if let Some(size) = self.sndbuf {
            out.push(SocketOption::SendBuffer(size));
        }
        if let Some(size) = self.rcvbuf {
            out.push(SocketOption::ReceiveBuffer(size));
        }
        if let Some(enabled) = self.ipv4_only {
            out.push(SocketOption::Ipv4Only(enabled));
        }
        if let Some(keepalive) = self.tcp_keepalive {
            out.push(SocketOption::TcpKeepAlive(keepalive));
        }
        out
    }

    /// Validate a socket identity.
    ///
    /// Identities must:
    /// - Be 1-255 bytes long
    /// - Not start with null byte (0x00) which is reserved for generated IDs
    pub fn validate_identity(id: &[u8]) -> Result<()> {
        if id.is_empty() {
            return Err(ZsockError::codec("identity cannot be empty"));
        }

        if id.len() > 255 {
            return Err(ZsockError::codec(format!(
                "identity cannot exceed 255 bytes (got {})",
                id.len()
            )));
        }

        if id[0] == 0x00 {
            return Err(ZsockError::codec(
                "identity cannot start with null byte (reserved for generated IDs)",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_identity() {
        let opt = SocketOption::Identity(Bytes::from_static(b"peer-1"));
        assert_eq!(
            opt.encode().unwrap(),
            Some((id::IDENTITY, RawValue::Bytes(b"peer-1".to_vec())))
        );
    }

    #[test]
    fn test_decode_identity() {
        let opt = OptionName::Identity
            .decode(RawValue::Bytes(b"peer-1".to_vec()))
            .unwrap();
        assert_eq!(opt, SocketOption::Identity(Bytes::from_static(b"peer-1")));
    }

    #[test]
    fn test_read_only_options_do_not_encode() {
        for opt in [
            SocketOption::Events(PollEvent::In),
            SocketOption::ReceiveMore(true),
            SocketOption::FileDescriptor(3),
            SocketOption::Type(SocketType::Req),
            SocketOption::LastEndpoint("tcp://127.0.0.1:5555".into()),
        ] {
            assert_eq!(opt.name().access(), Access::ReadOnly);
            assert_eq!(opt.encode().unwrap(), None);
        }
    }

    #[test]
    fn test_kind_matches_encoding() {
        let opts = [
            SocketOption::Affinity(3),
            SocketOption::MaxMessageSize(-1),
            SocketOption::Linger(0),
            SocketOption::Ipv4Only(false),
            SocketOption::Subscribe(Bytes::from_static(b"topic")),
        ];
        for opt in opts {
            let (_, raw) = opt.encode().unwrap().unwrap();
            assert_eq!(raw.kind(), opt.name().kind());
        }
    }

    #[test]
    fn test_decode_events_and_more() {
        assert_eq!(
            OptionName::Events.decode(RawValue::Int(3)).unwrap(),
            SocketOption::Events(PollEvent::InOut)
        );
        assert_eq!(
            OptionName::ReceiveMore.decode(RawValue::Int(1)).unwrap(),
            SocketOption::ReceiveMore(true)
        );
        assert_eq!(
            OptionName::Type.decode(RawValue::Int(7)).unwrap(),
            SocketOption::Type(SocketType::Pull)
        );
    }

    #[test]
    fn test_decode_last_endpoint_strips_nul() {
        let opt = OptionName::LastEndpoint
            .decode(RawValue::Bytes(b"tcp://127.0.0.1:5555\0".to_vec()))
            .unwrap();
        assert_eq!(opt, SocketOption::LastEndpoint("tcp://127.0.0.1:5555".into()));
    }

    #[test]
    fn test_decode_kind_mismatch() {
        let err = OptionName::Linger
            .decode(RawValue::Bytes(vec![1]))
            .unwrap_err();
        assert!(matches!(err, ZsockError::Codec(_)));

        assert!(OptionName::Affinity.decode(RawValue::Int(1)).is_err());
        assert!(OptionName::Type.decode(RawValue::Int(99)).is_err());
        assert!(OptionName::Subscribe.decode(RawValue::Bytes(vec![])).is_err());
    }

    #[test]
    fn test_identity_validation() {
        assert!(SocketOptions::validate_identity(b"client-001").is_ok());
        assert!(SocketOptions::validate_identity(&[0x01; 255]).is_ok());

        // Invalid: empty
        assert!(SocketOptions::validate_identity(b"").is_err());

        // Invalid: too long
        assert!(SocketOptions::validate_identity(&[0x01; 256]).is_err());

        // Invalid: starts with null byte
        assert!(SocketOptions::validate_identity(b"\x00client").is_err());

        assert!(SocketOption::Identity(Bytes::new()).encode().is_err());
    }

    #[test]
    fn test_default_options_set_nothing() {
        assert!(SocketOptions::default().to_options().is_empty());
        assert_eq!(ContextOptions::default().io_threads, 1);
    }

    #[test]
    fn test_builder_pattern() {
        let opts = SocketOptions::new()
            .with_recv_timeout(Duration::from_secs(5))
            .with_send_timeout(Duration::from_millis(250))
            .with_linger(None)
            .with_recv_hwm(2000)
            .with_max_msg_size(None);

        assert_eq!(
            opts.to_options(),
            vec![
                SocketOption::Linger(-1),
                SocketOption::ReceiveTimeout(5000),
                SocketOption::SendTimeout(250),
                SocketOption::ReceiveHighWm(2000),
                SocketOption::MaxMessageSize(-1),
            ]
        );
    }
}
