//! Poll event masks.
//!
//! The engine speaks in bit flags; callers speak in [`PollEvent`]. Both
//! directions of the mapping are total.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Raw engine event bits (`ZMQ_POLLIN`, `ZMQ_POLLOUT`, `ZMQ_POLLERR`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventFlags: i16 {
        const POLLIN = 1;
        const POLLOUT = 2;
        const POLLERR = 4;
    }
}

impl Default for EventFlags {
    fn default() -> Self {
        Self::empty()
    }
}

/// Requested or observed readiness of one wait source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PollEvent {
    /// Ready to receive.
    In,
    /// Ready to send.
    Out,
    /// Ready in either direction.
    InOut,
    /// Error condition (only meaningful for raw descriptors).
    Native,
    /// No activity.
    #[default]
    None,
}

impl PollEvent {
    /// Engine bits for this event.
    #[must_use]
    pub const fn to_flags(self) -> EventFlags {
        match self {
            Self::In => EventFlags::POLLIN,
            Self::Out => EventFlags::POLLOUT,
            Self::InOut => EventFlags::POLLIN.union(EventFlags::POLLOUT),
            Self::Native => EventFlags::POLLERR,
            Self::None => EventFlags::empty(),
        }
    }

    /// Map observed engine bits back; any other combination is `None`.
    #[must_use]
    pub fn from_flags(flags: EventFlags) -> Self {
        if flags == EventFlags::POLLIN {
            Self::In
        } else if flags == EventFlags::POLLOUT {
            Self::Out
        } else if flags == EventFlags::POLLIN | EventFlags::POLLOUT {
            Self::InOut
        } else if flags == EventFlags::POLLERR {
            Self::Native
        } else {
            Self::None
        }
    }

    /// Raw engine bits for this event.
    #[must_use]
    pub const fn to_bits(self) -> i16 {
        self.to_flags().bits()
    }

    /// Map raw engine bits back, ignoring bits the engine does not define.
    #[must_use]
    pub fn from_bits(bits: i16) -> Self {
        Self::from_flags(EventFlags::from_bits_retain(bits))
    }

    /// True when no activity is requested or observed.
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for PollEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::In => "IN",
            Self::Out => "OUT",
            Self::InOut => "INOUT",
            Self::Native => "ERR",
            Self::None => "NONE",
        };
        f.write_str(name)
    }
}

/// Direction a blocked transfer is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interest {
    /// Waiting to receive.
    Readable,
    /// Waiting to send.
    Writable,
}

impl Interest {
    /// The engine bit that signals this direction in the `Events` option.
    #[must_use]
    pub const fn flag(self) -> EventFlags {
        match self {
            Self::Readable => EventFlags::POLLIN,
            Self::Writable => EventFlags::POLLOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bits() {
        assert_eq!(PollEvent::In.to_bits(), 1);
        assert_eq!(PollEvent::Out.to_bits(), 2);
        assert_eq!(PollEvent::InOut.to_bits(), 3);
        assert_eq!(PollEvent::Native.to_bits(), 4);
        assert_eq!(PollEvent::None.to_bits(), 0);
    }

    #[test]
    fn test_every_event_maps_back() {
        for event in [
            PollEvent::In,
            PollEvent::Out,
            PollEvent::InOut,
            PollEvent::Native,
            PollEvent::None,
        ] {
            assert_eq!(PollEvent::from_bits(event.to_bits()), event);
        }
    }

    #[test]
    fn test_unrecognised_combination_is_none() {
        assert_eq!(PollEvent::from_bits(1 | 4), PollEvent::None);
        assert_eq!(PollEvent::from_bits(0x40), PollEvent::None);
        assert_eq!(PollEvent::from_bits(-1), PollEvent::None);
    }

    #[test]
    fn test_interest_flags() {
        assert!(EventFlags::from_bits_retain(3).contains(Interest::Readable.flag()));
        assert!(!EventFlags::POLLIN.contains(Interest::Writable.flag()));
    }
}
