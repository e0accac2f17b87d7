//! Engine contexts.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use zsock_core::engine::{Engine, RawContext};
use zsock_core::options::{ContextOptions, SocketOptions};
use zsock_core::pattern::{Pattern, Peer};
use zsock_core::scope::with_resource;
use zsock_core::error::{Result, ZsockError};

use crate::readiness::{Readiness, TokioReadiness};
use crate::socket::Socket;

/// An engine execution environment (its I/O thread pool).
///
/// Sockets borrow the context they were created from, so a context cannot
/// be terminated while any of its sockets is alive. Dropping a context
/// without calling [`Context::term`] terminates it.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use zsock::prelude::*;
/// use zsock_core::mock::MockEngine;
///
/// let ctx = Context::with_engine(Arc::new(MockEngine::new()), ContextOptions::default())?;
/// {
///     let socket = ctx.socket::<Pull>()?;
///     socket.bind("inproc://jobs")?;
/// }
/// ctx.term()?;
/// # Ok::<(), zsock::ZsockError>(())
/// ```
pub struct Context {
    engine: Arc<dyn Engine>,
    readiness: Arc<dyn Readiness>,
    raw: RawContext,
    alive: AtomicBool,
}

impl Context {
    /// Create a context on the libzmq engine with `io_threads` I/O threads.
    #[cfg(feature = "libzmq")]
    pub fn new(io_threads: i32) -> Result<Self> {
        Self::with_engine(
            Arc::new(zsock_libzmq::ZmqEngine::new()),
            ContextOptions::new().with_io_threads(io_threads),
        )
    }

    /// Create a context on an arbitrary engine.
    pub fn with_engine(engine: Arc<dyn Engine>, options: ContextOptions) -> Result<Self> {
        let raw = engine
            .init(options.io_threads)
            .map_err(|e| ZsockError::resource("init", e.to_string()))?;
        debug!("[CTX] Initialized with {} io threads", options.io_threads);
        Ok(Self {
            engine,
            readiness: Arc::new(TokioReadiness),
            raw,
            alive: AtomicBool::new(true),
        })
    }

    /// Replace the readiness notifier used by blocked transfers.
    #[must_use]
    pub fn with_readiness(mut self, readiness: Arc<dyn Readiness>) -> Self {
        self.readiness = readiness;
        self
    }

    pub(crate) fn engine(&self) -> &dyn Engine {
        &*self.engine
    }

    pub(crate) fn readiness(&self) -> &dyn Readiness {
        &*self.readiness
    }

    /// Native context reference.
    pub fn as_raw(&self) -> RawContext {
        self.raw
    }

    /// `(major, minor, patch)` of the underlying engine.
    pub fn version(&self) -> (i32, i32, i32) {
        self.engine.version()
    }

    /// Create a socket of pattern `P`.
    pub fn socket<P: Pattern>(&self) -> Result<Socket<'_, P>> {
        Socket::create(self)
    }

    /// Create a socket and apply `options` to it.
    ///
    /// If an option is rejected the socket is closed before the error is
    /// returned.
    pub fn socket_with_options<P: Pattern>(&self, options: &SocketOptions) -> Result<Socket<'_, P>> {
        let socket = Socket::create(self)?;
        for option in options.to_options() {
            socket.set_option(option)?;
        }
        Ok(socket)
    }

    /// Run `body` with a fresh socket that is closed on every exit path.
    pub fn with_socket<P, T, F>(&self, body: F) -> Result<T>
    where
        P: Pattern,
        F: FnOnce(&Socket<'_, P>) -> Result<T>,
    {
        with_resource(
            || self.socket::<P>(),
            |socket| {
                if let Err(e) = socket.close() {
                    warn!("[{}] Scoped close failed: {}", P::TYPE, e);
                }
            },
            |socket| body(socket),
        )
    }

    /// Create a bound `A` socket and an `B` socket connected to it.
    ///
    /// Only legal peer combinations compile.
    pub fn pair<A, B>(&self, endpoint: &str) -> Result<(Socket<'_, A>, Socket<'_, B>)>
    where
        A: Peer<B>,
        B: Pattern,
    {
        let server = self.socket::<A>()?;
        server.bind(endpoint)?;
        let client = self.socket::<B>()?;
        client.connect(endpoint)?;
        Ok((server, client))
    }

    /// Terminate the context.
    pub fn term(self) -> Result<()> {
        if self.alive.swap(false, Ordering::AcqRel) {
            self.engine
                .term(self.raw)
                .map_err(|e| ZsockError::resource("term", e.to_string()))?;
            debug!("[CTX] Terminated");
        }
        Ok(())
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if self.alive.swap(false, Ordering::AcqRel) {
            if let Err(e) = self.engine.term(self.raw) {
                warn!("[CTX] Terminate on drop failed: {}", e);
            }
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("raw", &self.raw)
            .field("alive", &self.alive.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}
