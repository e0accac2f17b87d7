//! [`Engine`] over libzmq.
//!
//! Native objects live in registries keyed by the opaque handles handed to
//! the typed layer, so a handle that outlives its object yields `ENOTSOCK`
//! instead of a dangling pointer. libzmq sockets are not thread-safe; each is
//! kept behind its own mutex. A poll holds the mutexes of the sockets it
//! watches until it returns, locked in handle order.

use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

use zsock_core::engine::{
    Engine, RawContext, RawKind, RawMessage, RawPollItem, RawSocket, RawValue, RecvFlags,
    SendFlags, ENOTSOCK,
};
use zsock_core::error::{EngineError, EngineResult};
use zsock_core::events::EventFlags;

use crate::error::ZmqResultExt;
use crate::sockopt;

type SharedSocket = Arc<Mutex<zmq::Socket>>;

fn not_a_socket() -> EngineError {
    EngineError::native(ENOTSOCK, "Socket operation on non-socket")
}

fn bad_handle() -> EngineError {
    EngineError::native(14, "Bad address")
}

/// libzmq-backed engine.
#[derive(Default)]
pub struct ZmqEngine {
    next_id: AtomicUsize,
    contexts: DashMap<usize, zmq::Context>,
    sockets: DashMap<usize, SharedSocket>,
    messages: DashMap<usize, Bytes>,
}

impl ZmqEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn socket_ref(&self, socket: RawSocket) -> EngineResult<SharedSocket> {
        self.sockets
            .get(&socket.0)
            .map(|s| Arc::clone(s.value()))
            .ok_or_else(not_a_socket)
    }

    fn with_socket<T>(
        &self,
        socket: RawSocket,
        f: impl FnOnce(&zmq::Socket) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let shared = self.socket_ref(socket)?;
        let guard = shared.lock();
        f(&guard)
    }
}

impl Engine for ZmqEngine {
    fn init(&self, io_threads: i32) -> EngineResult<RawContext> {
        let ctx = zmq::Context::new();
        ctx.set_io_threads(io_threads).engine()?;
        let id = self.next_id();
        self.contexts.insert(id, ctx);
        debug!("[libzmq] context {} created ({} io threads)", id, io_threads);
        Ok(RawContext(id))
    }

    fn term(&self, ctx: RawContext) -> EngineResult<()> {
        let (_, mut context) = self.contexts.remove(&ctx.0).ok_or_else(bad_handle)?;
        context.destroy().engine()?;
        debug!("[libzmq] context {} terminated", ctx.0);
        Ok(())
    }

    fn socket(&self, ctx: RawContext, wire_type: i32) -> EngineResult<RawSocket> {
        let kind = sockopt::socket_type(wire_type)?;
        let socket = {
            let context = self.contexts.get(&ctx.0).ok_or_else(bad_handle)?;
            context.socket(kind).engine()?
        };
        let id = self.next_id();
        self.sockets.insert(id, Arc::new(Mutex::new(socket)));
        Ok(RawSocket(id))
    }

    fn close(&self, socket: RawSocket) -> EngineResult<()> {
        // zmq::Socket closes the native socket when the last reference drops
        self.sockets
            .remove(&socket.0)
            .map(|_| ())
            .ok_or_else(not_a_socket)
    }

    fn bind(&self, socket: RawSocket, endpoint: &str) -> EngineResult<()> {
        self.with_socket(socket, |s| s.bind(endpoint).engine())
    }

    fn unbind(&self, socket: RawSocket, endpoint: &str) -> EngineResult<()> {
        self.with_socket(socket, |s| s.unbind(endpoint).engine())
    }

    fn connect(&self, socket: RawSocket, endpoint: &str) -> EngineResult<()> {
        self.with_socket(socket, |s| s.connect(endpoint).engine())
    }

    fn disconnect(&self, socket: RawSocket, endpoint: &str) -> EngineResult<()> {
        self.with_socket(socket, |s| s.disconnect(endpoint).engine())
    }

    fn msg_new(&self) -> EngineResult<RawMessage> {
        let id = self.next_id();
        self.messages.insert(id, Bytes::new());
        Ok(RawMessage(id))
    }

    fn msg_from(&self, data: &[u8]) -> EngineResult<RawMessage> {
        let id = self.next_id();
        self.messages.insert(id, Bytes::copy_from_slice(data));
        Ok(RawMessage(id))
    }

    fn msg_data(&self, msg: RawMessage) -> EngineResult<Bytes> {
        self.messages
            .get(&msg.0)
            .map(|m| m.value().clone())
            .ok_or_else(bad_handle)
    }

    fn msg_close(&self, msg: RawMessage) -> EngineResult<()> {
        self.messages
            .remove(&msg.0)
            .map(|_| ())
            .ok_or_else(bad_handle)
    }

    fn send(&self, socket: RawSocket, msg: RawMessage, flags: SendFlags) -> EngineResult<()> {
        let data = self.msg_data(msg)?;
        self.with_socket(socket, |s| s.send(&data[..], flags.bits()).engine())
    }

    fn recv(&self, socket: RawSocket, msg: RawMessage, flags: RecvFlags) -> EngineResult<()> {
        let mut frame = zmq::Message::new();
        self.with_socket(socket, |s| s.recv(&mut frame, flags.bits()).engine())?;
        let mut slot = self.messages.get_mut(&msg.0).ok_or_else(bad_handle)?;
        *slot = Bytes::copy_from_slice(&frame);
        Ok(())
    }

    fn setsockopt(&self, socket: RawSocket, id: i32, value: &RawValue) -> EngineResult<()> {
        self.with_socket(socket, |s| sockopt::set(s, id, value))
    }

    fn getsockopt(&self, socket: RawSocket, id: i32, kind: RawKind) -> EngineResult<RawValue> {
        self.with_socket(socket, |s| sockopt::get(s, id, kind))
    }

    fn poll(&self, items: &mut [RawPollItem], timeout_ms: i64) -> EngineResult<usize> {
        // lock each distinct socket once, in handle order
        let mut shared = BTreeMap::new();
        for item in items.iter() {
            if let Some(socket) = item.socket {
                if !shared.contains_key(&socket.0) {
                    shared.insert(socket.0, self.socket_ref(socket)?);
                }
            }
        }
        let guards: BTreeMap<usize, _> = shared.iter().map(|(id, s)| (*id, s.lock())).collect();

        let mut native: Vec<zmq::PollItem<'_>> = Vec::with_capacity(items.len());
        for item in items.iter() {
            let events = zmq::PollEvents::from_bits_truncate(item.events.bits());
            let slot = match item.socket {
                Some(socket) => match guards.get(&socket.0) {
                    Some(guard) => guard.as_poll_item(events),
                    None => return Err(not_a_socket()),
                },
                None => zmq::PollItem::from_fd(item.fd, events),
            };
            native.push(slot);
        }

        trace!("[libzmq] poll {} items, timeout {}ms", native.len(), timeout_ms);
        let ready = zmq::poll(&mut native, timeout_ms).engine()?;

        for (item, slot) in items.iter_mut().zip(native.iter()) {
            item.revents = EventFlags::from_bits_truncate(slot.get_revents().bits());
        }
        Ok(usize::try_from(ready).unwrap_or(0))
    }

    fn version(&self) -> (i32, i32, i32) {
        zmq::version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_handles_are_errors() {
        let engine = ZmqEngine::new();
        assert_eq!(engine.close(RawSocket(42)).unwrap_err().code(), ENOTSOCK);
        assert!(engine.msg_close(RawMessage(42)).is_err());
        assert!(engine.term(RawContext(42)).is_err());
    }

    #[test]
    fn test_message_registry() {
        let engine = ZmqEngine::new();
        let msg = engine.msg_from(b"hello").unwrap();
        assert_eq!(engine.msg_data(msg).unwrap(), Bytes::from_static(b"hello"));
        engine.msg_close(msg).unwrap();
        assert!(engine.msg_data(msg).is_err());
    }

    #[test]
    fn test_pair_over_inproc() {
        let engine = ZmqEngine::new();
        let ctx = engine.init(1).unwrap();
        let a = engine.socket(ctx, 0).unwrap();
        let b = engine.socket(ctx, 0).unwrap();
        engine.bind(a, "inproc://zsock-libzmq-pair").unwrap();
        engine.connect(b, "inproc://zsock-libzmq-pair").unwrap();

        let out = engine.msg_from(b"ping").unwrap();
        engine.send(b, out, SendFlags::empty()).unwrap();
        engine.msg_close(out).unwrap();

        let inc = engine.msg_new().unwrap();
        engine.recv(a, inc, SendFlags::empty()).unwrap();
        assert_eq!(engine.msg_data(inc).unwrap(), Bytes::from_static(b"ping"));
        engine.msg_close(inc).unwrap();

        engine.close(a).unwrap();
        engine.close(b).unwrap();
        engine.term(ctx).unwrap();
    }
}
