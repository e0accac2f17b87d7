//! Typed sockets.
//!
//! A [`Socket<P>`] is a native socket whose pattern `P` is fixed in its type.
//! Operations a pattern does not support are simply absent: `subscribe`
//! exists only for `Subscribe` patterns, `send` only for `Transmit`
//! patterns and `receive` only for `Receive` patterns.
//!
//! Release is at-most-once. [`Socket::close`] and `Drop` race on an atomic
//! flag; only the winner reaches the engine, and every later operation fails
//! with a "use of closed socket" resource error.

use bytes::{Bytes, BytesMut};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tracing::{debug, warn};

use zsock_core::engine::{Engine, RawFd, RawSocket, RawValue, RecvFlags, SendFlags};
use zsock_core::error::{Result, ZsockError};
use zsock_core::events::{EventFlags, Interest, PollEvent};
use zsock_core::options::{Access, OptionName, SocketOption};
use zsock_core::pattern::{Pattern, Receive, SocketType, Subscribe, Transmit};

use crate::bridge;
use crate::context::Context;
use crate::poll::PollItem;

/// Pattern-erased socket state shared by every `Socket<P>`.
///
/// Poll entries and the retry bridge work on this type so they need not be
/// generic over the pattern.
pub struct Handle<'ctx> {
    ctx: &'ctx Context,
    raw: RawSocket,
    alive: AtomicBool,
    close_signal: Notify,
    kind: SocketType,
}

/// A borrowed, pattern-erased socket.
pub type SocketRef<'a> = &'a Handle<'a>;

impl<'ctx> Handle<'ctx> {
    pub(crate) fn context(&self) -> &'ctx Context {
        self.ctx
    }

    pub(crate) fn engine(&self) -> &'ctx dyn Engine {
        self.ctx.engine()
    }

    /// Native reference, or the closed-socket error for `op`.
    pub(crate) fn check(&self, op: &'static str) -> Result<RawSocket> {
        if self.alive.load(Ordering::Acquire) {
            Ok(self.raw)
        } else {
            Err(ZsockError::closed(op))
        }
    }

    /// Completes once the socket is closed.
    ///
    /// Call [`Notified::enable`] before checking liveness, or a close in
    /// between is missed.
    pub(crate) fn closed(&self) -> Notified<'_> {
        self.close_signal.notified()
    }

    /// Descriptor the engine signals on when the socket's state changes.
    pub(crate) fn signal_fd(&self, op: &'static str) -> Result<RawFd> {
        let raw = self.check(op)?;
        let name = OptionName::FileDescriptor;
        let value = self
            .engine()
            .getsockopt(raw, name.id(), name.kind())
            .map_err(|e| ZsockError::io(op, e))?;
        match name.decode(value)? {
            SocketOption::FileDescriptor(fd) => Ok(fd),
            other => Err(ZsockError::codec(format!("expected descriptor, got {other:?}"))),
        }
    }

    /// Raw `Events` bits.
    ///
    /// Not decoded through [`PollEvent`], which folds error combinations
    /// into `None`.
    pub(crate) fn event_flags(&self, op: &'static str) -> Result<EventFlags> {
        let raw = self.check(op)?;
        let name = OptionName::Events;
        match self
            .engine()
            .getsockopt(raw, name.id(), name.kind())
            .map_err(|e| ZsockError::io(op, e))?
        {
            RawValue::Int(bits) => Ok(EventFlags::from_bits_truncate(bits as i16)),
            other => Err(ZsockError::codec(format!(
                "Events expects Int, engine returned {:?}",
                other.kind()
            ))),
        }
    }

    /// Wire type of the socket.
    pub fn socket_type(&self) -> SocketType {
        self.kind
    }

    /// Whether the socket has not been released yet.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Native socket reference (stale once the socket is closed).
    pub fn as_raw(&self) -> RawSocket {
        self.raw
    }

    fn close(&self) -> Result<()> {
        if self.alive.swap(false, Ordering::AcqRel) {
            // wake transfers and polls suspended on this socket
            self.close_signal.notify_waiters();
            self.engine()
                .close(self.raw)
                .map_err(|e| ZsockError::resource("close", e.to_string()))?;
            debug!("[{}] Socket closed", self.kind);
        }
        Ok(())
    }
}

impl Drop for Handle<'_> {
    fn drop(&mut self) {
        if self.alive.swap(false, Ordering::AcqRel) {
            match self.engine().close(self.raw) {
                Ok(()) => debug!("[{}] Socket released on drop", self.kind),
                Err(e) => warn!("[{}] Close on drop failed: {}", self.kind, e),
            }
        }
    }
}

impl fmt::Debug for Handle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("raw", &self.raw)
            .field("kind", &self.kind)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// A socket of pattern `P`, borrowed from its [`Context`].
pub struct Socket<'ctx, P: Pattern> {
    handle: Handle<'ctx>,
    _pattern: PhantomData<P>,
}

impl<'ctx, P: Pattern> Socket<'ctx, P> {
    pub(crate) fn create(ctx: &'ctx Context) -> Result<Self> {
        let raw = ctx
            .engine()
            .socket(ctx.as_raw(), P::TYPE.raw())
            .map_err(|e| ZsockError::resource("socket", e.to_string()))?;
        debug!("[{}] Socket created", P::TYPE);
        Ok(Self {
            handle: Handle {
                ctx,
                raw,
                alive: AtomicBool::new(true),
                close_signal: Notify::new(),
                kind: P::TYPE,
            },
            _pattern: PhantomData,
        })
    }

    /// Pattern-erased view, for polling.
    pub fn handle(&self) -> &Handle<'ctx> {
        &self.handle
    }

    /// Native socket reference (stale once the socket is closed).
    pub fn as_raw(&self) -> RawSocket {
        self.handle.raw
    }

    /// Wire type of the socket.
    pub fn socket_type(&self) -> SocketType {
        P::TYPE
    }

    /// Whether the socket has not been released yet.
    pub fn is_alive(&self) -> bool {
        self.handle.is_alive()
    }

    /// Release the native socket.
    ///
    /// Safe to call any number of times from any number of threads; the
    /// engine sees exactly one close. Only that call can fail. Sends,
    /// receives and polls suspended on the socket fail with the
    /// closed-socket error.
    pub fn close(&self) -> Result<()> {
        self.handle.close()
    }

    pub fn bind(&self, endpoint: &str) -> Result<()> {
        let raw = self.handle.check("bind")?;
        self.handle
            .engine()
            .bind(raw, endpoint)
            .map_err(|e| ZsockError::io("bind", e))?;
        debug!("[{}] Bound to {}", P::TYPE, endpoint);
        Ok(())
    }

    pub fn unbind(&self, endpoint: &str) -> Result<()> {
        let raw = self.handle.check("unbind")?;
        self.handle
            .engine()
            .unbind(raw, endpoint)
            .map_err(|e| ZsockError::io("unbind", e))?;
        debug!("[{}] Unbound from {}", P::TYPE, endpoint);
        Ok(())
    }

    pub fn connect(&self, endpoint: &str) -> Result<()> {
        let raw = self.handle.check("connect")?;
        self.handle
            .engine()
            .connect(raw, endpoint)
            .map_err(|e| ZsockError::io("connect", e))?;
        debug!("[{}] Connected to {}", P::TYPE, endpoint);
        Ok(())
    }

    pub fn disconnect(&self, endpoint: &str) -> Result<()> {
        let raw = self.handle.check("disconnect")?;
        self.handle
            .engine()
            .disconnect(raw, endpoint)
            .map_err(|e| ZsockError::io("disconnect", e))?;
        debug!("[{}] Disconnected from {}", P::TYPE, endpoint);
        Ok(())
    }

    /// Set an option.
    ///
    /// Read-only options are accepted and ignored. `Subscribe` and
    /// `Unsubscribe` fail with `Unsupported` unless the pattern subscribes.
    pub fn set_option(&self, option: SocketOption) -> Result<()> {
        let raw = self.handle.check("set_option")?;
        if matches!(
            option,
            SocketOption::Subscribe(_) | SocketOption::Unsubscribe(_)
        ) && !P::TYPE.can_subscribe()
        {
            return Err(ZsockError::unsupported("set_option", P::TYPE));
        }
        match option.encode()? {
            Some((id, value)) => self
                .handle
                .engine()
                .setsockopt(raw, id, &value)
                .map_err(|e| ZsockError::io("set_option", e)),
            None => {
                debug!("[{}] Ignoring read-only option {:?}", P::TYPE, option.name());
                Ok(())
            }
        }
    }

    /// Read an option back.
    ///
    /// Write-only options (`Subscribe`, `Unsubscribe`) are `Unsupported`.
    pub fn get_option(&self, name: OptionName) -> Result<SocketOption> {
        let raw = self.handle.check("get_option")?;
        if name.access() == Access::WriteOnly {
            return Err(ZsockError::unsupported("get_option", P::TYPE));
        }
        let value = self
            .handle
            .engine()
            .getsockopt(raw, name.id(), name.kind())
            .map_err(|e| ZsockError::io("get_option", e))?;
        name.decode(value)
    }

    /// Entry for [`Context::poll`].
    pub fn as_poll_item(&self, events: PollEvent) -> PollItem<'_> {
        PollItem::Socket {
            socket: &self.handle,
            events,
        }
    }
}

impl<P: Subscribe> Socket<'_, P> {
    /// Start receiving messages that begin with `prefix` (empty: everything).
    pub fn subscribe(&self, prefix: &[u8]) -> Result<()> {
        self.set_option(SocketOption::Subscribe(Bytes::copy_from_slice(prefix)))
    }

    /// Stop receiving messages that begin with `prefix`.
    pub fn unsubscribe(&self, prefix: &[u8]) -> Result<()> {
        self.set_option(SocketOption::Unsubscribe(Bytes::copy_from_slice(prefix)))
    }
}

impl<P: Transmit> Socket<'_, P> {
    /// Send one frame, suspending while the engine cannot accept it.
    ///
    /// `DONT_WAIT` is always added; pass `SEND_MORE` to start a multipart
    /// message.
    pub async fn send(&self, data: &[u8], flags: SendFlags) -> Result<()> {
        let raw = self.handle.check("send")?;
        let engine = self.handle.engine();
        let msg = bridge::message_from(engine, "send", data)?;
        let (buffer, flags) = (*msg, bridge::nonblocking(flags));
        bridge::transfer(&self.handle, "send", Interest::Writable, || {
            engine.send(raw, buffer, flags)
        })
        .await
    }

    /// Send the concatenation of `chunks` as a single frame.
    pub async fn send_lazy<I, B>(&self, chunks: I, flags: SendFlags) -> Result<()>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut buf = BytesMut::new();
        for chunk in chunks {
            buf.extend_from_slice(chunk.as_ref());
        }
        self.send(&buf, flags).await
    }

    /// Send every frame of a message; all but the last carry `SEND_MORE`.
    ///
    /// An empty message sends nothing.
    pub async fn send_multipart<I, B>(&self, frames: I, flags: SendFlags) -> Result<()>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut frames = frames.into_iter().peekable();
        while let Some(frame) = frames.next() {
            let flags = if frames.peek().is_some() {
                flags | SendFlags::SEND_MORE
            } else {
                flags.difference(SendFlags::SEND_MORE)
            };
            self.send(frame.as_ref(), flags).await?;
        }
        Ok(())
    }
}

impl<P: Receive> Socket<'_, P> {
    /// Receive one frame, suspending until one is available.
    pub async fn receive(&self, flags: RecvFlags) -> Result<Bytes> {
        let raw = self.handle.check("receive")?;
        let engine = self.handle.engine();
        let msg = bridge::message_new(engine, "receive")?;
        let (buffer, flags) = (*msg, bridge::nonblocking(flags));
        bridge::transfer(&self.handle, "receive", Interest::Readable, || {
            engine.recv(raw, buffer, flags)
        })
        .await?;
        engine
            .msg_data(buffer)
            .map_err(|e| ZsockError::io("receive", e))
    }

    /// Whether the last received frame has more frames following it.
    pub fn more(&self) -> Result<bool> {
        match self.get_option(OptionName::ReceiveMore)? {
            SocketOption::ReceiveMore(more) => Ok(more),
            other => Err(ZsockError::codec(format!(
                "expected ReceiveMore, got {other:?}"
            ))),
        }
    }

    /// Receive every frame of the next message.
    pub async fn receive_multipart(&self, flags: RecvFlags) -> Result<Vec<Bytes>> {
        let mut frames = vec![self.receive(flags).await?];
        while self.more()? {
            frames.push(self.receive(flags).await?);
        }
        Ok(frames)
    }
}

impl<P: Pattern> fmt::Debug for Socket<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Socket")
            .field("type", &P::TYPE)
            .field("raw", &self.handle.raw)
            .field("alive", &self.is_alive())
            .finish()
    }
}
