//! Readiness notification.
//!
//! A blocked send or receive suspends on the socket's signalling descriptor
//! (its `FileDescriptor` option) through a [`Readiness`] implementation. The
//! default, [`TokioReadiness`], registers the descriptor with the tokio
//! reactor; tests inject their own.

use async_trait::async_trait;
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use tokio::io::unix::AsyncFd;
use zsock_core::events::{EventFlags, Interest};

/// Suspends the calling task until a descriptor signals.
#[async_trait]
pub trait Readiness: Send + Sync {
    /// Wait until `fd` may have become ready for `interest`.
    ///
    /// Wakeups may be spurious; callers re-check the engine's event state.
    async fn wait(&self, fd: RawFd, interest: Interest) -> io::Result<()>;

    /// Wait until a plain descriptor may have any of `events`.
    ///
    /// Unlike a socket's signalling descriptor, a plain one is waited on in
    /// the requested direction. The default waits for readability unless
    /// only `POLLOUT` is requested.
    async fn wait_file(&self, fd: RawFd, events: EventFlags) -> io::Result<()> {
        let write_only =
            events.contains(EventFlags::POLLOUT) && !events.contains(EventFlags::POLLIN);
        let interest = if write_only {
            Interest::Writable
        } else {
            Interest::Readable
        };
        self.wait(fd, interest).await
    }
}

/// Borrowed descriptor; registering it does not take ownership.
struct Signal(RawFd);

impl AsRawFd for Signal {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

/// Readiness through the tokio reactor.
///
/// The engine's descriptor is an edge-triggered signal that becomes readable
/// whenever the socket's state changes, whichever direction is of interest,
/// so both interests wait for readability.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioReadiness;

#[async_trait]
impl Readiness for TokioReadiness {
    async fn wait(&self, fd: RawFd, _interest: Interest) -> io::Result<()> {
        let signal = AsyncFd::with_interest(Signal(fd), tokio::io::Interest::READABLE)?;
        let mut guard = signal.readable().await?;
        guard.clear_ready();
        Ok(())
    }

    async fn wait_file(&self, fd: RawFd, events: EventFlags) -> io::Result<()> {
        let wants_write = events.contains(EventFlags::POLLOUT);
        let wants_read =
            !wants_write || events.intersects(EventFlags::POLLIN | EventFlags::POLLERR);
        let interest = match (wants_read, wants_write) {
            (true, true) => tokio::io::Interest::READABLE | tokio::io::Interest::WRITABLE,
            (false, _) => tokio::io::Interest::WRITABLE,
            (true, false) => tokio::io::Interest::READABLE,
        };
        let file = AsyncFd::with_interest(Signal(fd), interest)?;
        match (wants_read, wants_write) {
            (true, true) => tokio::select! {
                guard = file.readable() => guard?.retain_ready(),
                guard = file.writable() => guard?.retain_ready(),
            },
            (false, _) => file.writable().await?.retain_ready(),
            (true, false) => file.readable().await?.retain_ready(),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    #[tokio::test]
    async fn test_wakes_when_descriptor_readable() {
        let (mut tx, rx) = UnixStream::pair().unwrap();
        rx.set_nonblocking(true).unwrap();
        tx.write_all(b"x").unwrap();

        TokioReadiness
            .wait(rx.as_raw_fd(), Interest::Readable)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_waits_until_written() {
        let (tx, rx) = UnixStream::pair().unwrap();
        rx.set_nonblocking(true).unwrap();
        let fd = rx.as_raw_fd();

        let writer = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            let mut tx = tx;
            tx.write_all(b"x").unwrap();
            tx
        });

        TokioReadiness.wait(fd, Interest::Writable).await.unwrap();
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn test_plain_descriptor_waits_in_requested_direction() {
        let (tx, _rx) = UnixStream::pair().unwrap();
        tx.set_nonblocking(true).unwrap();

        // nothing to read, but the send buffer has room
        let wait = TokioReadiness.wait_file(tx.as_raw_fd(), EventFlags::POLLOUT);
        tokio::time::timeout(std::time::Duration::from_secs(5), wait)
            .await
            .unwrap()
            .unwrap();
    }
}
