use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use bytes::{Buf, BytesMut};

use crate::protocol::{ProtocolVersion, QoS};

use super::{AllocError, OutgoingPacket, PacketAllocator};

/// Allocator that counts requests and can be told to fail either step.
#[derive(Debug, Clone, Default)]
pub(crate) struct CountingAllocator {
    pub packets: Arc<AtomicUsize>,
    pub buffers: Arc<AtomicUsize>,
    pub fail_packet: bool,
    pub fail_buffer: bool,
}

impl CountingAllocator {
    pub fn failing_packet() -> Self {
        Self { fail_packet: true, ..Self::default() }
    }

    pub fn failing_buffer() -> Self {
        Self { fail_buffer: true, ..Self::default() }
    }

    pub fn allocations(&self) -> usize {
        self.packets.load(Ordering::SeqCst) + self.buffers.load(Ordering::SeqCst)
    }
}

impl PacketAllocator for CountingAllocator {
    fn allocate_packet(&self, command: u8) -> Result<OutgoingPacket, AllocError> {
        self.packets.fetch_add(1, Ordering::SeqCst);
        if self.fail_packet {
            return Err(AllocError { requested: std::mem::size_of::<OutgoingPacket>() });
        }

        Ok(OutgoingPacket::new(command))
    }

    fn allocate_buffer(&self, capacity: usize) -> Result<BytesMut, AllocError> {
        self.buffers.fetch_add(1, Ordering::SeqCst);
        if self.fail_buffer {
            return Err(AllocError { requested: capacity });
        }

        Ok(BytesMut::with_capacity(capacity))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecodedWill {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: QoS,
    pub retain: bool,
}

/// Fields recovered from an encoded 3.x CONNECT packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DecodedConnect {
    pub command: u8,
    pub remaining_length: usize,
    pub protocol_name: String,
    pub protocol: Option<ProtocolVersion>,
    pub version_flags: u8,
    pub flags: u8,
    pub clean_session: bool,
    pub keep_alive: u16,
    pub client_id: String,
    pub will: Option<DecodedWill>,
    pub username: Option<String>,
    pub password: Option<Vec<u8>>,
    pub timestamp: Option<String>,
}

fn read_variable_byte_int(cursor: &mut &[u8]) -> usize {
    let mut multiplier = 1;
    let mut value = 0;

    loop {
        let encoded_byte = cursor.get_u8();
        value += (encoded_byte & 127) as usize * multiplier;
        multiplier *= 128;

        if encoded_byte & 128 == 0 {
            return value;
        }
    }
}

fn read_length_prefixed(cursor: &mut &[u8]) -> Vec<u8> {
    let len = cursor.get_u16() as usize;
    cursor.copy_to_bytes(len).to_vec()
}

fn read_string(cursor: &mut &[u8]) -> String {
    String::from_utf8(read_length_prefixed(cursor)).expect("field is not valid UTF-8")
}

/// Decode a CONNECT packet, panicking on anything malformed.
///
/// Also checks that the remaining length field matches the bytes that follow it.
pub(crate) fn decode_connect(bytes: &[u8]) -> DecodedConnect {
    let mut cursor = bytes;

    let command = cursor.get_u8();
    let remaining_length = read_variable_byte_int(&mut cursor);
    assert_eq!(cursor.remaining(), remaining_length, "remaining length does not match body");

    let protocol_name = read_string(&mut cursor);
    let level = cursor.get_u8();
    let flags = cursor.get_u8();
    let keep_alive = cursor.get_u16();

    assert_eq!(flags & 0x01, 0, "reserved connect flag is set");

    let client_id = read_string(&mut cursor);

    let will = if flags & 0x04 != 0 {
        let topic = read_string(&mut cursor);
        let payload = read_length_prefixed(&mut cursor);
        let qos = QoS::try_from((flags >> 3) & 0x03).expect("invalid will QoS");
        Some(DecodedWill { topic, payload, qos, retain: flags & 0x20 != 0 })
    } else {
        None
    };

    let username = (flags & 0x80 != 0).then(|| read_string(&mut cursor));
    let password = (flags & 0x40 != 0).then(|| read_length_prefixed(&mut cursor));

    let timestamp = cursor.has_remaining().then(|| read_string(&mut cursor));
    assert!(!cursor.has_remaining(), "trailing bytes after CONNECT payload");

    DecodedConnect {
        command,
        remaining_length,
        protocol_name,
        protocol: ProtocolVersion::from_level(level & 0x3F),
        version_flags: level & 0xC0,
        flags,
        clean_session: flags & 0x02 != 0,
        keep_alive,
        client_id,
        will,
        username,
        password,
        timestamp,
    }
}
