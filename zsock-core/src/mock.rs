//! In-memory engine for tests.
//!
//! Behaves like a tiny single-process messaging engine: bound and connected
//! sockets deliver to each other, options are stored per socket, and every
//! primitive can be scripted to fail, would-block, or be interrupted. Call
//! counters make at-most-once properties observable.

use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::engine::{
    Engine, RawContext, RawFd, RawKind, RawMessage, RawPollItem, RawSocket, RawValue, RecvFlags,
    SendFlags, EINVAL, ENOTSOCK,
};
use crate::error::{EngineError, EngineResult};
use crate::events::EventFlags;
use crate::options::id;

const EADDRINUSE: i32 = 98;
const EPROTONOSUPPORT: i32 = 93;
const EFSM: i32 = 156_384_763;

/// Base for the fake descriptor handed out as a socket's `FileDescriptor`.
pub const FD_BASE: RawFd = 1000;

#[derive(Default)]
struct MockSocket {
    wire_type: i32,
    options: HashMap<i32, RawValue>,
    inbox: VecDeque<(Vec<u8>, bool)>,
    sent: Vec<(Bytes, SendFlags)>,
    peers: Vec<usize>,
    next_peer: usize,
    last_more: bool,
    last_endpoint: Option<String>,
    ready: EventFlags,
    events: VecDeque<EventFlags>,
}

#[derive(Default)]
struct State {
    next_id: usize,
    contexts: HashMap<usize, bool>,
    sockets: HashMap<usize, MockSocket>,
    endpoints: HashMap<String, usize>,
    close_calls: HashMap<usize, usize>,
    messages: HashMap<usize, Vec<u8>>,
    ready_fds: HashMap<RawFd, EventFlags>,

    fail_socket: Option<EngineError>,
    fail_close: Option<EngineError>,
    fail_send: VecDeque<EngineError>,
    fail_recv: VecDeque<EngineError>,
    fail_poll: Option<EngineError>,
    would_block_sends: usize,
    would_block_recvs: usize,
    interrupted_polls: usize,

    send_calls: usize,
    recv_calls: usize,
    poll_calls: usize,
}

impl State {
    fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    fn socket(&mut self, socket: RawSocket) -> EngineResult<&mut MockSocket> {
        self.sockets
            .get_mut(&socket.0)
            .ok_or_else(|| EngineError::native(ENOTSOCK, "Socket operation on non-socket"))
    }
}

fn endpoint_check(endpoint: &str) -> EngineResult<()> {
    let Some((transport, addr)) = endpoint.split_once("://") else {
        return Err(EngineError::native(EINVAL, "Invalid argument"));
    };
    if addr.is_empty() {
        return Err(EngineError::native(EINVAL, "Invalid argument"));
    }
    match transport {
        "tcp" | "ipc" | "inproc" | "pgm" | "epgm" => Ok(()),
        _ => Err(EngineError::native(
            EPROTONOSUPPORT,
            "Protocol not supported",
        )),
    }
}

/// Scriptable in-memory [`Engine`].
#[derive(Default)]
pub struct MockEngine {
    state: Mutex<State>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor reported for `socket`'s `FileDescriptor` option.
    #[must_use]
    pub fn fd_of(socket: RawSocket) -> RawFd {
        FD_BASE + socket.0 as RawFd
    }

    /// Make the next `socket` call fail.
    pub fn fail_next_socket(&self, err: EngineError) {
        self.state.lock().fail_socket = Some(err);
    }

    /// Make the next `close` call fail (the socket is still released).
    pub fn fail_next_close(&self, err: EngineError) {
        self.state.lock().fail_close = Some(err);
    }

    /// Queue a failure for an upcoming `send`.
    pub fn fail_next_send(&self, err: EngineError) {
        self.state.lock().fail_send.push_back(err);
    }

    /// Queue a failure for an upcoming `recv`.
    pub fn fail_next_recv(&self, err: EngineError) {
        self.state.lock().fail_recv.push_back(err);
    }

    /// Make the next `poll` fail.
    pub fn fail_next_poll(&self, err: EngineError) {
        self.state.lock().fail_poll = Some(err);
    }

    /// The next `n` sends report would-block.
    pub fn would_block_sends(&self, n: usize) {
        self.state.lock().would_block_sends = n;
    }

    /// The next `n` receives report would-block even when a frame is queued.
    pub fn would_block_recvs(&self, n: usize) {
        self.state.lock().would_block_recvs = n;
    }

    /// The next `n` polls report interrupted.
    pub fn interrupt_polls(&self, n: usize) {
        self.state.lock().interrupted_polls = n;
    }

    /// Queue an incoming frame on `socket`.
    pub fn push_incoming(&self, socket: RawSocket, data: &[u8], more: bool) {
        if let Ok(s) = self.state.lock().socket(socket) {
            s.inbox.push_back((data.to_vec(), more));
        }
    }

    /// Frames sent on `socket`, in order.
    pub fn sent(&self, socket: RawSocket) -> Vec<Bytes> {
        self.state
            .lock()
            .sockets
            .get(&socket.0)
            .map(|s| s.sent.iter().map(|(b, _)| b.clone()).collect())
            .unwrap_or_default()
    }

    /// Flags of frames sent on `socket`, in order.
    pub fn sent_flags(&self, socket: RawSocket) -> Vec<SendFlags> {
        self.state
            .lock()
            .sockets
            .get(&socket.0)
            .map(|s| s.sent.iter().map(|(_, f)| *f).collect())
            .unwrap_or_default()
    }

    /// Readiness reported for `socket` by `poll`.
    pub fn set_ready(&self, socket: RawSocket, flags: EventFlags) {
        if let Ok(s) = self.state.lock().socket(socket) {
            s.ready = flags;
        }
    }

    /// Readiness reported for a raw descriptor by `poll`.
    pub fn set_fd_ready(&self, fd: RawFd, flags: EventFlags) {
        self.state.lock().ready_fds.insert(fd, flags);
    }

    /// Successive values of the `Events` option; once drained it reports
    /// `POLLIN | POLLOUT`.
    pub fn script_events(&self, socket: RawSocket, events: impl IntoIterator<Item = EventFlags>) {
        if let Ok(s) = self.state.lock().socket(socket) {
            s.events.extend(events);
        }
    }

    /// Raw value last stored for option `id` on `socket`.
    pub fn option(&self, socket: RawSocket, id: i32) -> Option<RawValue> {
        self.state
            .lock()
            .sockets
            .get(&socket.0)
            .and_then(|s| s.options.get(&id).cloned())
    }

    /// Number of times `close` was invoked for `socket`.
    pub fn close_calls(&self, socket: RawSocket) -> usize {
        self.state
            .lock()
            .close_calls
            .get(&socket.0)
            .copied()
            .unwrap_or(0)
    }

    /// Sockets created and not yet closed.
    pub fn live_sockets(&self) -> usize {
        self.state.lock().sockets.len()
    }

    /// Message buffers allocated and not yet released.
    pub fn live_messages(&self) -> usize {
        self.state.lock().messages.len()
    }

    /// Whether `ctx` has been terminated.
    pub fn is_terminated(&self, ctx: RawContext) -> bool {
        !self.state.lock().contexts.get(&ctx.0).copied().unwrap_or(false)
    }

    pub fn send_calls(&self) -> usize {
        self.state.lock().send_calls
    }

    pub fn recv_calls(&self) -> usize {
        self.state.lock().recv_calls
    }

    pub fn poll_calls(&self) -> usize {
        self.state.lock().poll_calls
    }
}

impl Engine for MockEngine {
    fn init(&self, io_threads: i32) -> EngineResult<RawContext> {
        if io_threads < 0 {
            return Err(EngineError::native(EINVAL, "Invalid argument"));
        }
        let mut state = self.state.lock();
        let ctx = state.next_id();
        state.contexts.insert(ctx, true);
        Ok(RawContext(ctx))
    }

    fn term(&self, ctx: RawContext) -> EngineResult<()> {
        let mut state = self.state.lock();
        match state.contexts.get_mut(&ctx.0) {
            Some(live) if *live => {
                *live = false;
                Ok(())
            }
            _ => Err(EngineError::native(14, "Bad address")),
        }
    }

    fn socket(&self, ctx: RawContext, wire_type: i32) -> EngineResult<RawSocket> {
        let mut state = self.state.lock();
        if let Some(err) = state.fail_socket.take() {
            return Err(err);
        }
        if state.contexts.get(&ctx.0) != Some(&true) {
            return Err(EngineError::native(14, "Bad address"));
        }
        if !(0..=10).contains(&wire_type) {
            return Err(EngineError::native(EINVAL, "Invalid argument"));
        }
        let id = state.next_id();
        state.sockets.insert(
            id,
            MockSocket {
                wire_type,
                ..MockSocket::default()
            },
        );
        Ok(RawSocket(id))
    }

    fn close(&self, socket: RawSocket) -> EngineResult<()> {
        let mut state = self.state.lock();
        *state.close_calls.entry(socket.0).or_default() += 1;
        let removed = state.sockets.remove(&socket.0);
        state.endpoints.retain(|_, owner| *owner != socket.0);
        if let Some(err) = state.fail_close.take() {
            return Err(err);
        }
        match removed {
            Some(_) => Ok(()),
            None => Err(EngineError::native(ENOTSOCK, "Socket operation on non-socket")),
        }
    }

    fn bind(&self, socket: RawSocket, endpoint: &str) -> EngineResult<()> {
        endpoint_check(endpoint)?;
        let mut state = self.state.lock();
        state.socket(socket)?;
        if state.endpoints.contains_key(endpoint) {
            return Err(EngineError::native(EADDRINUSE, "Address already in use"));
        }
        state.endpoints.insert(endpoint.to_string(), socket.0);
        state.socket(socket)?.last_endpoint = Some(endpoint.to_string());
        Ok(())
    }

    fn unbind(&self, socket: RawSocket, endpoint: &str) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.socket(socket)?;
        match state.endpoints.get(endpoint) {
            Some(owner) if *owner == socket.0 => {
                state.endpoints.remove(endpoint);
                Ok(())
            }
            _ => Err(EngineError::native(2, "No such file or directory")),
        }
    }

    fn connect(&self, socket: RawSocket, endpoint: &str) -> EngineResult<()> {
        endpoint_check(endpoint)?;
        let mut state = self.state.lock();
        state.socket(socket)?;
        if let Some(&peer) = state.endpoints.get(endpoint) {
            state.socket(socket)?.peers.push(peer);
            if let Some(p) = state.sockets.get_mut(&peer) {
                p.peers.push(socket.0);
            }
        }
        Ok(())
    }

    fn disconnect(&self, socket: RawSocket, endpoint: &str) -> EngineResult<()> {
        let mut state = self.state.lock();
        let peer = state.endpoints.get(endpoint).copied();
        let s = state.socket(socket)?;
        match peer {
            Some(peer) if s.peers.contains(&peer) => {
                s.peers.retain(|p| *p != peer);
                if let Some(p) = state.sockets.get_mut(&peer) {
                    p.peers.retain(|p| *p != socket.0);
                }
                Ok(())
            }
            _ => Err(EngineError::native(2, "No such file or directory")),
        }
    }

    fn msg_new(&self) -> EngineResult<RawMessage> {
        self.msg_from(&[])
    }

    fn msg_from(&self, data: &[u8]) -> EngineResult<RawMessage> {
        let mut state = self.state.lock();
        let id = state.next_id();
        state.messages.insert(id, data.to_vec());
        Ok(RawMessage(id))
    }

    fn msg_data(&self, msg: RawMessage) -> EngineResult<Bytes> {
        self.state
            .lock()
            .messages
            .get(&msg.0)
            .map(|d| Bytes::copy_from_slice(d))
            .ok_or_else(|| EngineError::native(14, "Bad address"))
    }

    fn msg_close(&self, msg: RawMessage) -> EngineResult<()> {
        self.state
            .lock()
            .messages
            .remove(&msg.0)
            .map(|_| ())
            .ok_or_else(|| EngineError::native(14, "Bad address"))
    }

    fn send(&self, socket: RawSocket, msg: RawMessage, flags: SendFlags) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.send_calls += 1;
        state.socket(socket)?;
        if let Some(err) = state.fail_send.pop_front() {
            return Err(err);
        }
        if state.would_block_sends > 0 {
            state.would_block_sends -= 1;
            return Err(EngineError::WouldBlock);
        }
        let data = state
            .messages
            .get(&msg.0)
            .cloned()
            .ok_or_else(|| EngineError::native(14, "Bad address"))?;
        let more = flags.contains(SendFlags::SEND_MORE);
        let s = state.socket(socket)?;
        if matches!(s.wire_type, 2 | 7) {
            return Err(EngineError::native(
                95,
                "Operation not supported",
            ));
        }
        s.sent.push((Bytes::from(data.clone()), flags));
        let target = if s.peers.is_empty() {
            None
        } else {
            let peer = s.peers[s.next_peer % s.peers.len()];
            if !more {
                s.next_peer += 1;
            }
            Some(peer)
        };
        if let Some(peer) = target {
            if let Some(p) = state.sockets.get_mut(&peer) {
                p.inbox.push_back((data, more));
            }
        }
        Ok(())
    }

    fn recv(&self, socket: RawSocket, msg: RawMessage, _flags: RecvFlags) -> EngineResult<()> {
        let mut state = self.state.lock();
        state.recv_calls += 1;
        state.socket(socket)?;
        if let Some(err) = state.fail_recv.pop_front() {
            return Err(err);
        }
        if state.would_block_recvs > 0 {
            state.would_block_recvs -= 1;
            return Err(EngineError::WouldBlock);
        }
        let s = state.socket(socket)?;
        if matches!(s.wire_type, 1 | 8) {
            return Err(EngineError::native(EFSM, "Operation cannot be accomplished in current state"));
        }
        let Some((data, more)) = s.inbox.pop_front() else {
            return Err(EngineError::WouldBlock);
        };
        s.last_more = more;
        match state.messages.get_mut(&msg.0) {
            Some(buf) => {
                *buf = data;
                Ok(())
            }
            None => Err(EngineError::native(14, "Bad address")),
        }
    }

    fn setsockopt(&self, socket: RawSocket, id: i32, value: &RawValue) -> EngineResult<()> {
        let mut state = self.state.lock();
        let s = state.socket(socket)?;
        match id {
            id::SUBSCRIBE | id::UNSUBSCRIBE if !matches!(s.wire_type, 2 | 10) => {
                Err(EngineError::native(EINVAL, "Invalid argument"))
            }
            id::RCVMORE | id::EVENTS | id::FD | id::TYPE | id::LAST_ENDPOINT => {
                Err(EngineError::native(EINVAL, "Invalid argument"))
            }
            _ => {
                s.options.insert(id, value.clone());
                Ok(())
            }
        }
    }

    fn getsockopt(&self, socket: RawSocket, id: i32, kind: RawKind) -> EngineResult<RawValue> {
        let mut state = self.state.lock();
        let s = state.socket(socket)?;
        let value = match id {
            id::EVENTS => {
                let events = s
                    .events
                    .pop_front()
                    .unwrap_or(EventFlags::POLLIN | EventFlags::POLLOUT);
                RawValue::Int(i32::from(events.bits()))
            }
            id::RCVMORE => RawValue::Int(i32::from(s.last_more)),
            id::TYPE => RawValue::Int(s.wire_type),
            id::FD => RawValue::Int(Self::fd_of(socket) as i32),
            id::LAST_ENDPOINT => {
                let mut bytes = s.last_endpoint.clone().unwrap_or_default().into_bytes();
                bytes.push(0);
                RawValue::Bytes(bytes)
            }
            id::SUBSCRIBE | id::UNSUBSCRIBE => {
                return Err(EngineError::native(EINVAL, "Invalid argument"))
            }
            _ => match s.options.get(&id) {
                Some(v) => v.clone(),
                None => match kind {
                    RawKind::Int => RawValue::Int(0),
                    RawKind::Long => RawValue::Long(-1),
                    RawKind::ULong => RawValue::ULong(0),
                    RawKind::Bytes => RawValue::Bytes(Vec::new()),
                },
            },
        };
        Ok(value)
    }

    fn poll(&self, items: &mut [RawPollItem], _timeout_ms: i64) -> EngineResult<usize> {
        let mut state = self.state.lock();
        state.poll_calls += 1;
        if state.interrupted_polls > 0 {
            state.interrupted_polls -= 1;
            return Err(EngineError::Interrupted);
        }
        if let Some(err) = state.fail_poll.take() {
            return Err(err);
        }
        let mut ready = 0;
        for item in items.iter_mut() {
            let observed = match item.socket {
                Some(socket) => state.socket(socket)?.ready,
                None => state
                    .ready_fds
                    .get(&item.fd)
                    .copied()
                    .unwrap_or(EventFlags::empty()),
            };
            item.revents = observed & item.events;
            if !item.revents.is_empty() {
                ready += 1;
            }
        }
        Ok(ready)
    }

    fn version(&self) -> (i32, i32, i32) {
        (3, 2, 5)
    }
}
