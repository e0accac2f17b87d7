//! Raw option get/set over the typed setters of the `zmq` crate.
//!
//! The `zmq` crate exposes one method per option rather than the raw
//! `zmq_setsockopt(id, value)` entry point, so ids are dispatched here.

use zsock_core::engine::{RawKind, RawValue, EINVAL};
use zsock_core::error::{EngineError, EngineResult};
use zsock_core::options::id;

use crate::error::ZmqResultExt;

fn invalid() -> EngineError {
    EngineError::native(EINVAL, "Invalid argument")
}

fn int(value: &RawValue) -> EngineResult<i32> {
    match value {
        RawValue::Int(v) => Ok(*v),
        _ => Err(invalid()),
    }
}

pub(crate) fn set(socket: &zmq::Socket, option: i32, value: &RawValue) -> EngineResult<()> {
    match (option, value) {
        (id::AFFINITY, RawValue::ULong(v)) => socket.set_affinity(*v),
        (id::MAXMSGSIZE, RawValue::Long(v)) => socket.set_maxmsgsize(*v),
        (id::IDENTITY, RawValue::Bytes(v)) => socket.set_identity(v),
        (id::SUBSCRIBE, RawValue::Bytes(v)) => socket.set_subscribe(v),
        (id::UNSUBSCRIBE, RawValue::Bytes(v)) => socket.set_unsubscribe(v),
        (id::RATE, v) => socket.set_rate(int(v)?),
        (id::RECOVERY_IVL, v) => socket.set_recovery_ivl(int(v)?),
        (id::SNDBUF, v) => socket.set_sndbuf(int(v)?),
        (id::RCVBUF, v) => socket.set_rcvbuf(int(v)?),
        (id::LINGER, v) => socket.set_linger(int(v)?),
        (id::RECONNECT_IVL, v) => socket.set_reconnect_ivl(int(v)?),
        (id::RECONNECT_IVL_MAX, v) => socket.set_reconnect_ivl_max(int(v)?),
        (id::BACKLOG, v) => socket.set_backlog(int(v)?),
        (id::SNDHWM, v) => socket.set_sndhwm(int(v)?),
        (id::RCVHWM, v) => socket.set_rcvhwm(int(v)?),
        (id::MULTICAST_HOPS, v) => socket.set_multicast_hops(int(v)?),
        (id::RCVTIMEO, v) => socket.set_rcvtimeo(int(v)?),
        (id::SNDTIMEO, v) => socket.set_sndtimeo(int(v)?),
        (id::IPV4ONLY, v) => socket.set_ipv6(int(v)? == 0),
        (id::TCP_KEEPALIVE, v) => socket.set_tcp_keepalive(int(v)?),
        _ => return Err(invalid()),
    }
    .engine()
}

pub(crate) fn get(socket: &zmq::Socket, option: i32, kind: RawKind) -> EngineResult<RawValue> {
    let value = match option {
        id::AFFINITY => RawValue::ULong(socket.get_affinity().engine()?),
        id::MAXMSGSIZE => RawValue::Long(socket.get_maxmsgsize().engine()?),
        id::IDENTITY => RawValue::Bytes(socket.get_identity().engine()?),
        id::LAST_ENDPOINT => match socket.get_last_endpoint().engine()? {
            Ok(endpoint) => RawValue::Bytes(endpoint.into_bytes()),
            Err(raw) => RawValue::Bytes(raw),
        },
        id::RATE => RawValue::Int(socket.get_rate().engine()?),
        id::RECOVERY_IVL => RawValue::Int(socket.get_recovery_ivl().engine()?),
        id::SNDBUF => RawValue::Int(socket.get_sndbuf().engine()?),
        id::RCVBUF => RawValue::Int(socket.get_rcvbuf().engine()?),
        id::RCVMORE => RawValue::Int(i32::from(socket.get_rcvmore().engine()?)),
        id::FD => RawValue::Int(socket.get_fd().engine()? as i32),
        id::EVENTS => RawValue::Int(i32::from(socket.get_events().engine()?.bits())),
        id::TYPE => RawValue::Int(socket_type_raw(socket.get_socket_type().engine()?)),
        id::LINGER => RawValue::Int(socket.get_linger().engine()?),
        id::RECONNECT_IVL => RawValue::Int(socket.get_reconnect_ivl().engine()?),
        id::RECONNECT_IVL_MAX => RawValue::Int(socket.get_reconnect_ivl_max().engine()?),
        id::BACKLOG => RawValue::Int(socket.get_backlog().engine()?),
        id::SNDHWM => RawValue::Int(socket.get_sndhwm().engine()?),
        id::RCVHWM => RawValue::Int(socket.get_rcvhwm().engine()?),
        id::MULTICAST_HOPS => RawValue::Int(socket.get_multicast_hops().engine()?),
        id::RCVTIMEO => RawValue::Int(socket.get_rcvtimeo().engine()?),
        id::SNDTIMEO => RawValue::Int(socket.get_sndtimeo().engine()?),
        id::IPV4ONLY => RawValue::Int(i32::from(!socket.is_ipv6().engine()?)),
        id::TCP_KEEPALIVE => RawValue::Int(socket.get_tcp_keepalive().engine()?),
        _ => return Err(invalid()),
    };
    if value.kind() != kind {
        return Err(invalid());
    }
    Ok(value)
}

pub(crate) fn socket_type(wire_type: i32) -> EngineResult<zmq::SocketType> {
    Ok(match wire_type {
        0 => zmq::PAIR,
        1 => zmq::PUB,
        2 => zmq::SUB,
        3 => zmq::REQ,
        4 => zmq::REP,
        5 => zmq::DEALER,
        6 => zmq::ROUTER,
        7 => zmq::PULL,
        8 => zmq::PUSH,
        9 => zmq::XPUB,
        10 => zmq::XSUB,
        _ => return Err(invalid()),
    })
}

fn socket_type_raw(ty: zmq::SocketType) -> i32 {
    match ty {
        zmq::PAIR => 0,
        zmq::PUB => 1,
        zmq::SUB => 2,
        zmq::REQ => 3,
        zmq::REP => 4,
        zmq::DEALER => 5,
        zmq::ROUTER => 6,
        zmq::PULL => 7,
        zmq::PUSH => 8,
        zmq::XPUB => 9,
        zmq::XSUB => 10,
        _ => -1,
    }
}
