//! zsock Core
//!
//! This crate contains the engine-agnostic building blocks:
//! - Compile-time socket pattern tags and capabilities (`pattern`)
//! - The native engine boundary (`engine`)
//! - Typed socket options and their raw codec (`options`)
//! - Poll event masks (`events`)
//! - Scoped acquisition with guaranteed release (`scope`)
//! - Error types (`error`)
//! - An in-memory engine for tests (`mock`, feature `mock`)

#![cfg_attr(not(test), deny(unsafe_code))]
// Allow some pedantic lints that are intentional in this crate
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::match_same_arms)]
pub mod engine;
pub mod error;
pub mod events;
pub mod options;
pub mod pattern;
pub mod scope;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Optional: a small prelude to make downstream crates ergonomic.
// Keep it minimal to avoid API lock-in.
pub mod prelude {
    pub use crate::engine::{Engine, RawFd, RawPollItem, RawSocket, RecvFlags, SendFlags};
    pub use crate::error::{EngineError, Result, ZsockError};
    pub use crate::events::{EventFlags, Interest, PollEvent};
    pub use crate::options::{ContextOptions, OptionName, SocketOption, SocketOptions};
    pub use crate::pattern::{
        Dealer, Pair, Pattern, Peer, Pub, Pull, Push, Receive, Rep, Req, Router, SocketType, Sub,
        Subscribe, Transmit, XPub, XRep, XReq, XSub,
    };
    pub use crate::scope::{with_resource, Scoped};
}
