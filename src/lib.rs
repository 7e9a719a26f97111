//! Encoder for the MQTT 3.1 / 3.1.1 CONNECT packet.
//!
//! A [`Connection`](connection::Connection) carries the identity, will and
//! role used to build the packet. `Connection::send_connect` sizes, encodes
//! and hands the packet to an [`OutboundQueue`](queue::OutboundQueue).

pub mod config;
pub mod connection;
pub(crate) mod codec;
pub(crate) mod constants;
pub mod packets;
pub mod protocol;
pub mod queue;
pub mod role;
pub mod session;
pub mod time;
pub mod will;
