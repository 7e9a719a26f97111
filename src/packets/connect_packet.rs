use std::fmt;

use bytes::{BufMut, BytesMut};

use crate::{
    codec::{length_prefixed_len, write_length_prefixed},
    constants::{CONNECT_PACKET_TYPE, NODE_TIMESTAMP_FIELD_LEN},
    protocol::{ProtocolVersion, UnsupportedVersion},
    queue::QueueError,
    role::Identity,
    will::Will,
};

use super::{
    AllocError, CommonPacketError, EncodablePacket, OutgoingPacket, Packet, PacketAllocator,
};

const USERNAME_FLAG: u8 = 0b1000_0000;
const PASSWORD_FLAG: u8 = 0b0100_0000;
const WILL_RETAIN_FLAG: u8 = 0b0010_0000;
const WILL_QOS_SHIFT: u8 = 3;
const WILL_FLAG: u8 = 0b0000_0100;
const CLEAN_SESSION_FLAG: u8 = 0b0000_0010;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectError {
    /// The connection's dialect has no 3.x CONNECT framing. Nothing was allocated.
    InvalidProtocolVersion(ProtocolVersion),

    /// The packet descriptor or its buffer could not be allocated.
    OutOfMemory,

    /// The outbound queue refused the packet.
    Queue(QueueError),

    Common(CommonPacketError),
}

impl std::error::Error for ConnectError {}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidProtocolVersion(version) => {
                write!(f, "Invalid Protocol Version: {version}")
            }
            Self::OutOfMemory => write!(f, "Out Of Memory"),
            Self::Queue(e) => write!(f, "Queue Error: {e}"),
            Self::Common(e) => write!(f, "Common Error: {e}"),
        }
    }
}

impl From<UnsupportedVersion> for ConnectError {
    fn from(UnsupportedVersion(version): UnsupportedVersion) -> Self {
        Self::InvalidProtocolVersion(version)
    }
}

impl From<AllocError> for ConnectError {
    fn from(_: AllocError) -> Self {
        Self::OutOfMemory
    }
}

impl From<CommonPacketError> for ConnectError {
    fn from(e: CommonPacketError) -> Self {
        Self::Common(e)
    }
}

/// Compose the CONNECT flags byte.
///
/// | Bit | 7        | 6        | 5           | 4 - 3    | 2         | 1             | 0        |
/// |-----|----------|----------|-------------|----------|-----------|---------------|----------|
/// |     | Username | Password | Will Retain | Will QoS | Will Flag | Clean Session | Reserved |
///
/// Will bits are only set when a will is present. The password bit is only
/// set when a username is also present.
pub(crate) fn connect_flags(
    clean_session: bool,
    will: Option<&Will>,
    username: Option<&str>,
    password: Option<&[u8]>,
) -> u8 {
    let mut flags = 0;

    if clean_session {
        flags |= CLEAN_SESSION_FLAG;
    }

    if let Some(will) = will {
        flags |= WILL_FLAG | (will.qos.to_u8() & 0b11) << WILL_QOS_SHIFT;
        if will.retain {
            flags |= WILL_RETAIN_FLAG;
        }
    }

    if username.is_some() {
        flags |= USERNAME_FLAG;
        if password.is_some() {
            flags |= PASSWORD_FLAG;
        }
    }

    flags
}

/// A CONNECT packet ready to be written, borrowing its fields from the connection.
#[derive(Debug)]
pub(crate) struct ConnectPacket<'a> {
    pub protocol: ProtocolVersion,

    /// Extension bits OR'd into the protocol level byte (bridge private, cluster meet).
    pub version_flags: u8,

    pub clean_session: bool,

    pub keep_alive: u16,

    pub identity: Identity<'a>,

    pub will: Option<&'a Will>,

    /// Hex local time sent to a cluster peer. Only set for cluster node connections.
    pub timestamp: Option<String>,
}

impl ConnectPacket<'_> {
    /// Byte count of every payload field, length prefixes included.
    pub(crate) fn payload_len(&self) -> usize {
        let mut len = length_prefixed_len(self.identity.client_id.as_bytes());

        if let Some(will) = self.will {
            len += length_prefixed_len(will.topic.as_bytes()) + length_prefixed_len(&will.payload);
        }

        if let Some(username) = self.identity.username {
            len += length_prefixed_len(username.as_bytes());
            if let Some(password) = self.identity.password {
                len += length_prefixed_len(password);
            }
        }

        if self.timestamp.is_some() {
            len += NODE_TIMESTAMP_FIELD_LEN;
        }

        len
    }

    pub(crate) fn flags(&self) -> u8 {
        connect_flags(
            self.clean_session,
            self.will,
            self.identity.username,
            self.identity.password,
        )
    }

    fn write_payload(&self, buf: &mut BytesMut) -> Result<(), CommonPacketError> {
        write_length_prefixed(buf, self.identity.client_id.as_bytes())?;

        if let Some(will) = self.will {
            write_length_prefixed(buf, will.topic.as_bytes())?;
            write_length_prefixed(buf, &will.payload)?;
        }

        if let Some(username) = self.identity.username {
            write_length_prefixed(buf, username.as_bytes())?;
            if let Some(password) = self.identity.password {
                write_length_prefixed(buf, password)?;
            }
        }

        if let Some(timestamp) = &self.timestamp {
            write_length_prefixed(buf, timestamp.as_bytes())?;
        }

        Ok(())
    }
}

impl Packet for ConnectPacket<'_> {
    fn packet_type() -> u8 {
        CONNECT_PACKET_TYPE
    }
}

impl EncodablePacket for ConnectPacket<'_> {
    type Error = ConnectError;

    fn encode(&self, allocator: &dyn PacketAllocator) -> Result<OutgoingPacket, Self::Error> {
        // Resolved before anything is allocated
        let wire = self.protocol.wire()?;

        let remaining_length = wire.header_len + self.payload_len();

        let mut packet = allocator.allocate_packet(Self::packet_type() << 4)?;
        packet.alloc(remaining_length, allocator)?;

        let buf = packet.buf_mut();

        // Variable header
        write_length_prefixed(buf, wire.name.as_bytes())?;
        buf.put_u8(wire.level | self.version_flags);
        buf.put_u8(self.flags());
        buf.put_u16(self.keep_alive);

        self.write_payload(buf)?;

        let actual = packet.written_len();
        if actual != remaining_length {
            return Err(CommonPacketError::LengthMismatch { expected: remaining_length, actual }
                .into());
        }

        Ok(packet)
    }
}
