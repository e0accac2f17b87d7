//! Poll multiplexer.
//!
//! Waits on several sockets and raw descriptors at once. Entries are
//! pattern-erased, so sockets of different patterns can share one poll.
//!
//! ```rust
//! use std::sync::Arc;
//! use zsock::prelude::*;
//! use zsock_core::mock::MockEngine;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> zsock::Result<()> {
//! let ctx = Context::with_engine(Arc::new(MockEngine::new()), ContextOptions::default())?;
//! let jobs = ctx.socket::<Pull>()?;
//! let control = ctx.socket::<Sub>()?;
//!
//! let items = [jobs.as_poll_item(PollEvent::In), control.as_poll_item(PollEvent::In)];
//! let ready = ctx.poll(&items, 0).await?;
//! assert_eq!(ready.len(), 2);
//! assert!(ready.iter().all(|item| item.events().is_none()));
//! # Ok(())
//! # }
//! ```

use futures::future::{self, BoxFuture, FutureExt};
use smallvec::SmallVec;
use std::fmt;
use std::pin::Pin;
use tokio::sync::futures::Notified;
use tokio::time::{sleep_until, Duration, Instant};
use tracing::trace;

use zsock_core::engine::{RawFd, RawPollItem};
use zsock_core::error::{EngineError, Result, ZsockError};
use zsock_core::events::{EventFlags, Interest, PollEvent};

use crate::context::Context;
use crate::socket::SocketRef;

/// Native slots kept inline for typical poll sizes.
type Slots = SmallVec<[RawPollItem; 8]>;

/// One wait source and the events requested of (or observed on) it.
#[derive(Clone, Copy)]
pub enum PollItem<'a> {
    /// A socket of any pattern.
    Socket {
        socket: SocketRef<'a>,
        events: PollEvent,
    },
    /// A raw OS descriptor.
    File { fd: RawFd, events: PollEvent },
}

impl<'a> PollItem<'a> {
    /// Entry for a raw descriptor.
    pub fn file(fd: RawFd, events: PollEvent) -> Self {
        Self::File { fd, events }
    }

    /// Requested events on input, observed events on output.
    pub fn events(&self) -> PollEvent {
        match self {
            Self::Socket { events, .. } | Self::File { events, .. } => *events,
        }
    }

    /// The socket of a socket entry.
    pub fn socket(&self) -> Option<SocketRef<'a>> {
        match self {
            Self::Socket { socket, .. } => Some(socket),
            Self::File { .. } => None,
        }
    }

    /// The descriptor of a file entry.
    pub fn fd(&self) -> Option<RawFd> {
        match self {
            Self::Socket { .. } => None,
            Self::File { fd, .. } => Some(*fd),
        }
    }

    fn with_events(self, events: PollEvent) -> Self {
        match self {
            Self::Socket { socket, .. } => Self::Socket { socket, events },
            Self::File { fd, .. } => Self::File { fd, events },
        }
    }

    fn to_raw(self, ctx: &Context) -> Result<RawPollItem> {
        match self {
            Self::Socket { socket, events } => {
                let raw = socket.check("poll")?;
                if !std::ptr::eq(socket.context(), ctx) {
                    return Err(ZsockError::resource(
                        "poll",
                        "socket belongs to another context",
                    ));
                }
                Ok(RawPollItem::socket(raw, events.to_flags()))
            }
            Self::File { fd, events } => Ok(RawPollItem::fd(fd, events.to_flags())),
        }
    }
}

impl fmt::Debug for PollItem<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket { socket, events } => f
                .debug_struct("Socket")
                .field("socket", socket)
                .field("events", events)
                .finish(),
            Self::File { fd, events } => f
                .debug_struct("File")
                .field("fd", fd)
                .field("events", events)
                .finish(),
        }
    }
}

/// Close signals of the socket entries, armed before their liveness is
/// checked.
fn close_signals<'a>(items: &[PollItem<'a>]) -> Vec<Pin<Box<Notified<'a>>>> {
    items
        .iter()
        .filter_map(PollItem::socket)
        .map(|socket| {
            let mut closed = Box::pin(socket.closed());
            closed.as_mut().enable();
            closed
        })
        .collect()
}

/// Direction to report when waiting on a socket's signalling descriptor.
fn interest_of(events: PollEvent) -> Interest {
    if events.to_flags().contains(EventFlags::POLLIN) || events == PollEvent::Native {
        Interest::Readable
    } else {
        Interest::Writable
    }
}

impl Context {
    /// Wait until at least one entry is ready or `timeout_ms` elapses.
    ///
    /// A negative timeout waits forever; zero returns immediately. The result
    /// has one entry per input entry, in the same order, carrying the events
    /// observed on it ([`PollEvent::None`] when nothing happened).
    ///
    /// The engine is only ever polled without blocking. In between, the task
    /// suspends on the sockets' signalling descriptors and the raw
    /// descriptors, so dropping the future abandons the wait.
    ///
    /// Interrupted polls are retried. Closed sockets fail with a resource
    /// error before the engine is called, including sockets closed while the
    /// poll is suspended.
    pub async fn poll<'a>(&self, items: &[PollItem<'a>], timeout_ms: i64) -> Result<Vec<PollItem<'a>>> {
        let deadline = u64::try_from(timeout_ms)
            .ok()
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        loop {
            let closed = close_signals(items);
            let mut slots = items
                .iter()
                .map(|item| item.to_raw(self))
                .collect::<Result<Slots>>()?;

            let ready = self.poll_now(&mut slots)?;
            let expired = deadline.is_some_and(|at| Instant::now() >= at);
            if ready > 0 || expired || items.is_empty() {
                trace!("[POLL] {} of {} items ready", ready, slots.len());
                return Ok(items
                    .iter()
                    .zip(slots.iter())
                    .map(|(item, slot)| item.with_events(PollEvent::from_flags(slot.revents)))
                    .collect());
            }

            self.wait_for_change(items, closed, deadline).await?;
            trace!("[POLL] Woken, polling again");
        }
    }

    /// One non-blocking engine poll, retried while interrupted.
    fn poll_now(&self, slots: &mut [RawPollItem]) -> Result<usize> {
        loop {
            match self.engine().poll(slots, 0) {
                Ok(ready) => return Ok(ready),
                Err(EngineError::Interrupted) => trace!("[POLL] Interrupted, retrying"),
                Err(e) => return Err(ZsockError::io("poll", e)),
            }
        }
    }

    /// Suspend until a descriptor signals, a socket closes, or `deadline`.
    async fn wait_for_change<'a>(
        &self,
        items: &[PollItem<'a>],
        closed: Vec<Pin<Box<Notified<'a>>>>,
        deadline: Option<Instant>,
    ) -> Result<()> {
        let mut signals: SmallVec<[(RawFd, Interest); 8]> = SmallVec::new();
        let mut files: SmallVec<[(RawFd, EventFlags); 8]> = SmallVec::new();
        for item in items {
            match *item {
                PollItem::Socket { socket, events } => {
                    if events.is_none() {
                        continue;
                    }
                    let fd = socket.signal_fd("poll")?;
                    if !signals.iter().any(|(seen, _)| *seen == fd) {
                        signals.push((fd, interest_of(events)));
                    }
                }
                PollItem::File { fd, events } => {
                    let flags = events.to_flags();
                    if flags.is_empty() {
                        continue;
                    }
                    match files.iter_mut().find(|(seen, _)| *seen == fd) {
                        Some((_, merged)) => *merged |= flags,
                        None => files.push((fd, flags)),
                    }
                }
            }
        }

        let readiness = self.readiness();
        let mut waits: Vec<BoxFuture<'_, Result<()>>> =
            Vec::with_capacity(signals.len() + files.len() + closed.len());
        for (fd, interest) in signals {
            let wait = readiness.wait(fd, interest);
            waits.push(wait.map(|r| r.map_err(ZsockError::from)).boxed());
        }
        for (fd, flags) in files {
            let wait = readiness.wait_file(fd, flags);
            waits.push(wait.map(|r| r.map_err(ZsockError::from)).boxed());
        }
        for signal in closed {
            waits.push(signal.map(|()| Ok::<(), ZsockError>(())).boxed());
        }

        let woken = async move {
            if waits.is_empty() {
                future::pending::<Result<()>>().await
            } else {
                future::select_all(waits).await.0
            }
        };
        match deadline {
            Some(at) => tokio::select! {
                woken = woken => woken,
                () = sleep_until(at) => Ok(()),
            },
            None => woken.await,
        }
    }
}
