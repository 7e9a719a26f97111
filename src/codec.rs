use bytes::{BufMut, BytesMut};

use crate::{
    constants::{MAX_PACKET_SIZE, MAX_STRING_LENGTH},
    packets::CommonPacketError,
};

/// Number of bytes needed to encode `value` as a variable byte integer.
///
/// Reference: <https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718023>
pub(crate) fn variable_byte_int_len(value: usize) -> usize {
    match value {
        0..=127 => 1,
        128..=16_383 => 2,
        16_384..=2_097_151 => 3,
        _ => 4,
    }
}

/// Write a variable byte integer.
///
/// Reference: <https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718023>
///
/// **Specification:**
///
/// ```text
/// do
///    encodedByte = X MOD 128
///    X = X DIV 128
///    // if there are more data to encode, set the top bit of this byte
///    if (X > 0)
///       encodedByte = encodedByte OR 128
///    endif
///    'output' encodedByte
/// while (X > 0)
/// ```
///
/// # Errors
/// - Returns `CommonPacketError::PacketTooLarge` if the value exceeds `MAX_PACKET_SIZE`.
pub(crate) fn write_variable_byte_int(
    buf: &mut BytesMut,
    mut value: usize,
) -> Result<(), CommonPacketError> {
    if value > MAX_PACKET_SIZE {
        return Err(CommonPacketError::PacketTooLarge(Some(format!(
            "Remaining length {value} exceeds {MAX_PACKET_SIZE}"
        ))));
    }

    for _ in 0..variable_byte_int_len(value) {
        // Take the 7 least significant bits
        let mut encoded_byte = (value % 128) as u8;
        value /= 128;

        // Mark the byte as a continuation byte if there is more to write
        if value > 0 {
            encoded_byte |= 128;
        }

        buf.put_u8(encoded_byte);
    }

    Ok(())
}

/// Number of bytes a length-prefixed field occupies on the wire.
pub(crate) fn length_prefixed_len(value: &[u8]) -> usize {
    2 + value.len()
}

/// Write a 2-byte big-endian length followed by the raw bytes.
///
/// This is the single framing primitive for every variable field of the
/// CONNECT packet: protocol name, client id, will topic and payload,
/// username, password and the cluster timestamp.
///
/// Reference: <https://docs.oasis-open.org/mqtt/mqtt/v3.1.1/os/mqtt-v3.1.1-os.html#_Toc398718016>
///
/// # Errors
/// - Returns `CommonPacketError::StringTooLong` if the length does not fit in 16 bits.
pub(crate) fn write_length_prefixed(
    buf: &mut BytesMut,
    value: &[u8],
) -> Result<(), CommonPacketError> {
    let len = value.len();
    let casted_len = u16::try_from(len).map_err(|_| CommonPacketError::StringTooLong(len))?;

    buf.put_u16(casted_len);
    buf.put_slice(value);

    Ok(())
}

/// Checks that a field fits behind a 2-byte length prefix.
pub(crate) fn fits_length_prefix(value: &[u8]) -> bool {
    value.len() <= MAX_STRING_LENGTH
}
