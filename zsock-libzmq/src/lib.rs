//! # zsock libzmq backend
//!
//! The production [`Engine`](zsock_core::engine::Engine) for zsock, driving
//! libzmq through the `zmq` crate.
//!
//! ## Overview
//!
//! - Every primitive maps onto one libzmq call (`zmq_socket`, `zmq_close`,
//!   `zmq_msg_send`, `zmq_poll`, ...)
//! - EAGAIN and EINTR surface as `EngineError::WouldBlock` and
//!   `EngineError::Interrupted`; the typed layer retries those
//! - Native objects are owned by handle registries, never by raw pointers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zsock_core::engine::Engine;
//! use zsock_libzmq::ZmqEngine;
//!
//! let engine = ZmqEngine::new();
//! let ctx = engine.init(1).unwrap();
//! let socket = engine.socket(ctx, 0).unwrap();
//! engine.bind(socket, "inproc://example").unwrap();
//! engine.close(socket).unwrap();
//! engine.term(ctx).unwrap();
//! ```

// Allow some pedantic lints
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod engine;
mod error;
mod sockopt;

pub use engine::ZmqEngine;
pub use error::from_zmq;
