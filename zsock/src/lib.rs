//! # zsock
//!
//! Type-checked ZeroMQ sockets with blocking-looking async calls over a
//! non-blocking engine.
//!
//! ## Architecture
//!
//! - **`zsock-core`**: pattern tags, option codec, event masks, the `Engine`
//!   boundary and an in-memory mock engine
//! - **`zsock-libzmq`**: the libzmq `Engine` backend
//! - **`zsock`**: public API surface (this crate)
//!
//! The libzmq backend is gated behind a feature:
//!
//! ```toml
//! [dependencies]
//! zsock = { version = "0.1", features = ["libzmq"] }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "libzmq")]
//! # async fn example() -> zsock::Result<()> {
//! use zsock::prelude::*;
//!
//! let ctx = Context::new(1)?;
//! let (pull, push) = ctx.pair::<Pull, Push>("inproc://jobs")?;
//!
//! push.send(b"job-1", SendFlags::empty()).await?;
//! let job = pull.receive(RecvFlags::empty()).await?;
//! assert_eq!(&job[..], b"job-1");
//! # Ok(())
//! # }
//! ```
//!
//! ## Pattern typing
//!
//! Operations a pattern does not support do not exist on its socket type.
//! Subscribing on a request socket is rejected by the compiler:
//!
//! ```rust,compile_fail
//! use std::sync::Arc;
//! use zsock::prelude::*;
//! use zsock_core::mock::MockEngine;
//!
//! let ctx = Context::with_engine(Arc::new(MockEngine::new()), ContextOptions::default()).unwrap();
//! let req = ctx.socket::<Req>().unwrap();
//! req.subscribe(b"weather").unwrap();
//! ```
//!
//! So is receiving on a push socket:
//!
//! ```rust,compile_fail
//! use std::sync::Arc;
//! use zsock::prelude::*;
//! use zsock_core::mock::MockEngine;
//!
//! async fn drain(ctx: &Context) -> zsock::Result<()> {
//!     let push = ctx.socket::<Push>()?;
//!     push.receive(RecvFlags::empty()).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Blocking calls
//!
//! `send` and `receive` never block a thread. The engine is always called
//! with `DONT_WAIT`; when it would block, the task suspends on the socket's
//! signalling descriptor through a [`Readiness`] implementation and retries
//! once the socket reports the needed direction.

#![warn(clippy::all)]

mod bridge;
pub mod context;
pub mod dev_tracing;
pub mod poll;
pub mod readiness;
pub mod socket;

pub use bytes::Bytes;
pub use context::Context;
pub use poll::PollItem;
pub use readiness::{Readiness, TokioReadiness};
pub use socket::{Handle, Socket, SocketRef};
pub use zsock_core::error::{EngineError, Result, ZsockError};

/// `(major, minor, patch)` of the linked libzmq.
#[cfg(feature = "libzmq")]
pub fn version() -> (i32, i32, i32) {
    use zsock_core::engine::Engine;
    zsock_libzmq::ZmqEngine::new().version()
}

/// Everything needed to create and use sockets.
pub mod prelude {
    pub use crate::context::Context;
    pub use crate::poll::PollItem;
    pub use crate::readiness::{Readiness, TokioReadiness};
    pub use crate::socket::{Socket, SocketRef};
    pub use zsock_core::prelude::*;
}
