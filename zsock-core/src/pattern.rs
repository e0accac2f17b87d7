//! Socket patterns, as runtime values and as compile-time tags.
//!
//! [`SocketType`] is the runtime enumeration of the engine's wire-level socket
//! types. The zero-sized tags ([`Pair`], [`Pub`], [`Sub`], ...) carry the same
//! information in the type system: a `Socket<Req>` simply has no `subscribe`
//! method, and a `Socket<Push>` has no `receive`. Capabilities are separate
//! marker traits implemented per tag, never inherited.

use std::fmt;

/// ZeroMQ socket types.
///
/// Corresponds to the ZMQ_TYPE socket option (16).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SocketType {
    /// PAIR socket for exclusive bidirectional communication
    Pair = 0,

    /// PUB socket for publishing messages to subscribers
    Pub = 1,

    /// SUB socket for subscribing to published messages
    Sub = 2,

    /// REQ socket for synchronous request-reply client
    Req = 3,

    /// REP socket for synchronous request-reply server
    Rep = 4,

    /// XREQ (DEALER) socket for asynchronous request-reply
    XReq = 5,

    /// XREP (ROUTER) socket for routing messages by identity
    XRep = 6,

    /// PULL socket for receiving messages from pushers
    Pull = 7,

    /// PUSH socket for sending messages to pullers
    Push = 8,

    /// XPUB socket for extended publisher with subscription awareness
    XPub = 9,

    /// XSUB socket for extended subscriber with dynamic subscriptions
    XSub = 10,
}

impl SocketType {
    /// Engine constant for this socket type.
    #[must_use]
    pub const fn raw(self) -> i32 {
        self as i32
    }

    /// Map an engine constant back to a socket type.
    #[must_use]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        Some(match raw {
            0 => Self::Pair,
            1 => Self::Pub,
            2 => Self::Sub,
            3 => Self::Req,
            4 => Self::Rep,
            5 => Self::XReq,
            6 => Self::XRep,
            7 => Self::Pull,
            8 => Self::Push,
            9 => Self::XPub,
            10 => Self::XSub,
            _ => return None,
        })
    }

    /// Get the socket type as a string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pair => "PAIR",
            Self::Pub => "PUB",
            Self::Sub => "SUB",
            Self::Req => "REQ",
            Self::Rep => "REP",
            Self::XReq => "XREQ",
            Self::XRep => "XREP",
            Self::Pull => "PULL",
            Self::Push => "PUSH",
            Self::XPub => "XPUB",
            Self::XSub => "XSUB",
        }
    }

    /// Only SUB and XSUB accept subscribe/unsubscribe.
    #[must_use]
    pub const fn can_subscribe(self) -> bool {
        matches!(self, Self::Sub | Self::XSub)
    }

    /// Check if this socket type is compatible with the given peer type.
    pub fn is_compatible(&self, peer: SocketType) -> bool {
        matches!(
            (self, peer),
            (Self::Pair, Self::Pair)
                | (Self::Pub | Self::XPub, Self::Sub | Self::XSub)
                | (Self::Sub | Self::XSub, Self::Pub | Self::XPub)
                | (Self::Req | Self::XReq, Self::Rep | Self::XRep)
                | (Self::Rep | Self::XRep, Self::Req | Self::XReq)
                | (Self::XReq, Self::XReq)
                | (Self::XRep, Self::XRep)
                | (Self::Push, Self::Pull)
                | (Self::Pull, Self::Push)
        )
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// A compile-time socket pattern tag.
///
/// Sealed: the set of patterns is closed and fixed by the engine.
pub trait Pattern: sealed::Sealed + Send + Sync + 'static {
    /// Wire-level socket type of this pattern.
    const TYPE: SocketType;
}

/// Patterns that accept subscribe/unsubscribe.
pub trait Subscribe: Pattern {}

/// Patterns with a defined receive operation.
pub trait Receive: Pattern {}

/// Patterns with a defined send operation.
pub trait Transmit: Pattern {}

/// `Self` may legally be connected to a socket of pattern `P`.
pub trait Peer<P: Pattern>: Pattern {}

macro_rules! patterns {
    ($($(#[$doc:meta])* $name:ident => $ty:ident;)*) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
            pub struct $name;

            impl sealed::Sealed for $name {}

            impl Pattern for $name {
                const TYPE: SocketType = SocketType::$ty;
            }
        )*
    };
}

patterns! {
    /// Exclusive pair.
    Pair => Pair;
    /// Publisher.
    Pub => Pub;
    /// Subscriber.
    Sub => Sub;
    /// Extended publisher.
    XPub => XPub;
    /// Extended subscriber.
    XSub => XSub;
    /// Request.
    Req => Req;
    /// Reply.
    Rep => Rep;
    /// Extended request (DEALER).
    XReq => XReq;
    /// Extended reply (ROUTER).
    XRep => XRep;
    /// Pipeline sink.
    Pull => Pull;
    /// Pipeline source.
    Push => Push;
}

/// DEALER is the later name of XREQ.
pub type Dealer = XReq;

/// ROUTER is the later name of XREP.
pub type Router = XRep;

macro_rules! capability {
    ($trait:ident: $($name:ident),*) => {
        $(impl $trait for $name {})*
    };
}

capability!(Subscribe: Sub, XSub);
capability!(Receive: Pair, Sub, XPub, XSub, Req, Rep, XReq, XRep, Pull);
capability!(Transmit: Pair, Pub, XPub, XSub, Req, Rep, XReq, XRep, Push);

macro_rules! peers {
    ($($a:ident <-> $b:ident),* $(,)?) => {
        $(
            impl Peer<$b> for $a {}
        )*
    };
}

peers! {
    Pair <-> Pair,
    Pub <-> Sub, Pub <-> XSub, XPub <-> Sub, XPub <-> XSub,
    Sub <-> Pub, XSub <-> Pub, Sub <-> XPub, XSub <-> XPub,
    Req <-> Rep, Req <-> XRep, XReq <-> Rep, XReq <-> XRep,
    Rep <-> Req, XRep <-> Req, Rep <-> XReq, XRep <-> XReq,
    XReq <-> XReq, XRep <-> XRep,
    Push <-> Pull, Pull <-> Push,
}
