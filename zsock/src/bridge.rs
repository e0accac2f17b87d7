//! Non-blocking retry bridge.
//!
//! Every engine transfer is issued with `DONT_WAIT`. When the engine reports
//! would-block (or an interrupted call), the task suspends on the socket's
//! signalling descriptor, re-checks the `Events` option for the direction it
//! needs, and retries. Any other engine error ends the loop.
//!
//! The descriptor is edge-triggered and may wake the task without the socket
//! being ready, so a wakeup is only trusted after `Events` confirms it.
//!
//! A close from elsewhere releases the descriptor, which then never signals.
//! Suspended transfers also watch the socket's close signal and fail with the
//! closed-socket error.

use tracing::{trace, warn};

use zsock_core::engine::{Engine, RawMessage, SendFlags};
use zsock_core::error::{EngineResult, Result, ZsockError};
use zsock_core::events::Interest;
use zsock_core::scope::Scoped;

use crate::socket::Handle;

/// Engine message buffer released through `msg_close` when dropped.
pub(crate) type Message<'e> = Scoped<RawMessage, Box<dyn FnOnce(RawMessage) + Send + Sync + 'e>>;

fn scoped<'e>(engine: &'e dyn Engine, op: &'static str, msg: RawMessage) -> Message<'e> {
    Scoped::new(
        msg,
        Box::new(move |msg| {
            if let Err(e) = engine.msg_close(msg) {
                warn!("[{}] Releasing message buffer failed: {}", op, e);
            }
        }),
    )
}

/// Allocate an empty buffer for a receive.
pub(crate) fn message_new<'e>(engine: &'e dyn Engine, op: &'static str) -> Result<Message<'e>> {
    let msg = engine.msg_new().map_err(|e| ZsockError::resource(op, e.to_string()))?;
    Ok(scoped(engine, op, msg))
}

/// Allocate a buffer holding a copy of `data` for a send.
pub(crate) fn message_from<'e>(
    engine: &'e dyn Engine,
    op: &'static str,
    data: &[u8],
) -> Result<Message<'e>> {
    let msg = engine
        .msg_from(data)
        .map_err(|e| ZsockError::resource(op, e.to_string()))?;
    Ok(scoped(engine, op, msg))
}

/// Caller flags with `DONT_WAIT` forced on.
pub(crate) fn nonblocking(flags: SendFlags) -> SendFlags {
    flags | SendFlags::DONT_WAIT
}

/// Run `attempt` until it succeeds or fails with a non-transient error.
///
/// Between attempts the task waits for `handle`'s descriptor to signal and
/// for the `Events` option to report `interest`, or for the socket to close.
pub(crate) async fn transfer<T, F>(
    handle: &Handle<'_>,
    op: &'static str,
    interest: Interest,
    mut attempt: F,
) -> Result<T>
where
    F: FnMut() -> EngineResult<T>,
{
    let readiness = handle.context().readiness();
    let closed = handle.closed();
    tokio::pin!(closed);
    closed.as_mut().enable();

    loop {
        handle.check(op)?;
        match attempt() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() => {
                trace!("[{}] {} would block ({}), waiting", handle.socket_type(), op, e);
            }
            Err(e) => return Err(ZsockError::io(op, e)),
        }

        let fd = handle.signal_fd(op)?;
        loop {
            tokio::select! {
                woken = readiness.wait(fd, interest) => woken?,
                () = &mut closed => {
                    trace!("[{}] {} abandoned, socket closed", handle.socket_type(), op);
                    return Err(ZsockError::closed(op));
                }
            }
            let events = handle.event_flags(op)?;
            if events.contains(interest.flag()) {
                break;
            }
            trace!(
                "[{}] {} spurious wakeup on fd {} (events {:?})",
                handle.socket_type(),
                op,
                fd,
                events
            );
        }
    }
}
