use std::{error::Error, fmt};

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    codec::{variable_byte_int_len, write_variable_byte_int},
    constants::MAX_PACKET_SIZE,
};

pub mod connect_packet;

#[cfg(test)]
pub(crate) mod test_support;

pub(crate) trait Packet {
    fn packet_type() -> u8;
}

pub(crate) trait EncodablePacket: Packet + Sized {
    type Error: Error + 'static + Send + Sync;

    /// Encode the packet into a buffer obtained from `allocator`.
    fn encode(&self, allocator: &dyn PacketAllocator) -> Result<OutgoingPacket, Self::Error>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommonPacketError {
    PacketTooLarge(Option<String>),
    StringTooLong(usize),
    LengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for CommonPacketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PacketTooLarge(Some(reason)) => write!(f, "Packet Too Large: {reason}"),
            Self::PacketTooLarge(None) => write!(f, "Packet Too Large"),

            Self::StringTooLong(len) => {
                write!(f, "Field length {len} does not fit in a 2-byte length prefix")
            }

            Self::LengthMismatch { expected, actual } => write!(
                f,
                "Remaining length mismatch: computed {expected} bytes, wrote {actual} bytes"
            ),
        }
    }
}

impl Error for CommonPacketError {}

/// A packet descriptor and, once allocated, its encoded bytes.
///
/// The buffer holds the whole packet: command byte, remaining length and
/// the variable header and payload written by the encoder.
#[derive(Debug)]
pub struct OutgoingPacket {
    command: u8,
    remaining_length: usize,
    buf: BytesMut,
}

impl OutgoingPacket {
    pub(crate) fn new(command: u8) -> Self {
        Self { command, remaining_length: 0, buf: BytesMut::new() }
    }

    /// Allocate a buffer sized for `remaining_length` and write the fixed header into it.
    pub(crate) fn alloc(
        &mut self,
        remaining_length: usize,
        allocator: &dyn PacketAllocator,
    ) -> Result<(), AllocError> {
        if remaining_length > MAX_PACKET_SIZE {
            return Err(AllocError { requested: remaining_length });
        }

        let capacity = 1 + variable_byte_int_len(remaining_length) + remaining_length;
        let mut buf = allocator.allocate_buffer(capacity)?;

        buf.put_u8(self.command);
        write_variable_byte_int(&mut buf, remaining_length)
            .map_err(|_| AllocError { requested: remaining_length })?;

        self.remaining_length = remaining_length;
        self.buf = buf;

        Ok(())
    }

    pub(crate) fn buf_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    /// Length of the fixed header (command byte plus remaining length field).
    pub fn fixed_header_len(&self) -> usize {
        1 + variable_byte_int_len(self.remaining_length)
    }

    /// Number of bytes written after the fixed header so far.
    pub(crate) fn written_len(&self) -> usize {
        self.buf.len().saturating_sub(self.fixed_header_len())
    }

    /// The first byte of the fixed header.
    pub fn command(&self) -> u8 {
        self.command
    }

    /// Declared length of everything following the fixed header.
    pub fn remaining_length(&self) -> usize {
        self.remaining_length
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Returned by a `PacketAllocator` that cannot satisfy a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError {
    pub requested: usize,
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unable to allocate {} bytes", self.requested)
    }
}

impl Error for AllocError {}

/// Source of packet descriptors and packet buffers.
pub trait PacketAllocator: Send {
    /// Reserve a descriptor for a packet with the given command byte.
    fn allocate_packet(&self, command: u8) -> Result<OutgoingPacket, AllocError> {
        Ok(OutgoingPacket::new(command))
    }

    /// Return an empty buffer with room for exactly `capacity` bytes.
    fn allocate_buffer(&self, capacity: usize) -> Result<BytesMut, AllocError>;
}

/// Heap allocator that refuses requests above a byte limit.
#[derive(Debug, Clone, Copy)]
pub struct HeapAllocator {
    limit: usize,
}

impl HeapAllocator {
    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }
}

impl Default for HeapAllocator {
    fn default() -> Self {
        // Largest packet the remaining length field can describe
        Self { limit: 1 + 4 + MAX_PACKET_SIZE }
    }
}

impl PacketAllocator for HeapAllocator {
    fn allocate_buffer(&self, capacity: usize) -> Result<BytesMut, AllocError> {
        if capacity > self.limit {
            return Err(AllocError { requested: capacity });
        }

        Ok(BytesMut::with_capacity(capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_writes_fixed_header() {
        let mut packet = OutgoingPacket::new(0x10);
        packet.alloc(17, &HeapAllocator::default()).unwrap();

        assert_eq!(packet.as_bytes(), &[0x10, 17]);
        assert_eq!(packet.fixed_header_len(), 2);
        assert_eq!(packet.remaining_length(), 17);
        assert_eq!(packet.written_len(), 0);
        assert!(packet.buf.capacity() >= 19);
    }

    #[test]
    fn alloc_uses_multi_byte_remaining_length() {
        let mut packet = OutgoingPacket::new(0x10);
        packet.alloc(321, &HeapAllocator::default()).unwrap();

        assert_eq!(packet.as_bytes(), &[0x10, 0xC1, 0x02]);
        assert_eq!(packet.fixed_header_len(), 3);
    }

    #[test]
    fn heap_allocator_refuses_requests_over_limit() {
        let allocator = HeapAllocator::with_limit(8);

        assert!(allocator.allocate_buffer(8).is_ok());
        assert_eq!(allocator.allocate_buffer(9), Err(AllocError { requested: 9 }));

        let mut packet = OutgoingPacket::new(0x10);
        assert!(packet.alloc(16, &allocator).is_err());
        assert!(packet.as_bytes().is_empty());
    }

    #[test]
    fn alloc_refuses_remaining_length_over_protocol_maximum() {
        let mut packet = OutgoingPacket::new(0x10);
        let result = packet.alloc(MAX_PACKET_SIZE + 1, &HeapAllocator::default());

        assert!(result.is_err());
    }
}
