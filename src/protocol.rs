use std::fmt;

use crate::constants::{
    HEADER_LEN_V31, HEADER_LEN_V311, PROTOCOL_LEVEL_V31, PROTOCOL_LEVEL_V311, PROTOCOL_LEVEL_V5,
    PROTOCOL_NAME_V31, PROTOCOL_NAME_V311,
};

/// MQTT protocol dialects a connection can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolVersion {
    /// MQTT 3.1, protocol name "MQIsdp".
    V31,

    /// MQTT 3.1.1, protocol name "MQTT".
    #[default]
    V311,

    /// MQTT 5.0. Not supported by the 3.x CONNECT encoder.
    V5,
}

/// Wire constants of a supported dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WireVersion {
    /// Protocol name written as a length-prefixed string.
    pub name: &'static str,

    /// Protocol level byte, before any extension bits are OR'd in.
    pub level: u8,

    /// Length of the CONNECT variable header.
    pub header_len: usize,
}

/// Returned when a dialect has no 3.x CONNECT framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedVersion(pub ProtocolVersion);

impl fmt::Display for UnsupportedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported protocol version: {}", self.0)
    }
}

impl std::error::Error for UnsupportedVersion {}

impl ProtocolVersion {
    /// Converts a protocol level byte to a `ProtocolVersion`.
    ///
    /// Extension bits (0x80, 0x40) must be masked off by the caller.
    /// Returns `None` if the value does not match a known dialect.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            PROTOCOL_LEVEL_V31 => Some(Self::V31),
            PROTOCOL_LEVEL_V311 => Some(Self::V311),
            PROTOCOL_LEVEL_V5 => Some(Self::V5),
            _ => None,
        }
    }

    /// Maps the dialect to its CONNECT wire constants.
    ///
    /// # Errors
    /// - Returns `UnsupportedVersion` for any dialect other than 3.1 and 3.1.1.
    pub(crate) fn wire(self) -> Result<WireVersion, UnsupportedVersion> {
        match self {
            Self::V31 => Ok(WireVersion {
                name: PROTOCOL_NAME_V31,
                level: PROTOCOL_LEVEL_V31,
                header_len: HEADER_LEN_V31,
            }),
            Self::V311 => Ok(WireVersion {
                name: PROTOCOL_NAME_V311,
                level: PROTOCOL_LEVEL_V311,
                header_len: HEADER_LEN_V311,
            }),
            Self::V5 => Err(UnsupportedVersion(self)),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::V31 => "3.1",
            Self::V311 => "3.1.1",
            Self::V5 => "5.0",
        };

        write!(f, "{value}")
    }
}

/// Quality of service of a will message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
}

/// Returned when a raw value is not a valid `QoS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidQos(pub u8);

impl fmt::Display for InvalidQos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QoS must be 0, 1 or 2. Got: {}", self.0)
    }
}

impl std::error::Error for InvalidQos {}

impl QoS {
    /// Converts the `QoS` to its numeric value.
    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for QoS {
    type Error = InvalidQos;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::AtMostOnce),
            1 => Ok(Self::AtLeastOnce),
            2 => Ok(Self::ExactlyOnce),
            _ => Err(InvalidQos(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v31_uses_mqisdp_and_twelve_byte_header() {
        let wire = ProtocolVersion::V31.wire().unwrap();

        assert_eq!(wire.name, "MQIsdp");
        assert_eq!(wire.name.len(), 6);
        assert_eq!(wire.level, 3);
        assert_eq!(wire.header_len, 12);
    }

    #[test]
    fn v311_uses_mqtt_and_ten_byte_header() {
        let wire = ProtocolVersion::V311.wire().unwrap();

        assert_eq!(wire.name, "MQTT");
        assert_eq!(wire.name.len(), 4);
        assert_eq!(wire.level, 4);
        assert_eq!(wire.header_len, 10);
    }

    #[test]
    fn header_len_matches_fixed_fields() {
        for version in [ProtocolVersion::V31, ProtocolVersion::V311] {
            let wire = version.wire().unwrap();
            // name prefix + name + level + flags + keep alive
            assert_eq!(wire.header_len, 2 + wire.name.len() + 1 + 1 + 2);
        }
    }

    #[test]
    fn v5_is_rejected() {
        assert_eq!(
            ProtocolVersion::V5.wire(),
            Err(UnsupportedVersion(ProtocolVersion::V5))
        );
    }

    #[test]
    fn from_level_maps_known_levels() {
        assert_eq!(ProtocolVersion::from_level(3), Some(ProtocolVersion::V31));
        assert_eq!(ProtocolVersion::from_level(4), Some(ProtocolVersion::V311));
        assert_eq!(ProtocolVersion::from_level(5), Some(ProtocolVersion::V5));
        assert_eq!(ProtocolVersion::from_level(0x84), None);
    }

    #[test]
    fn qos_try_from() {
        assert_eq!(QoS::try_from(0), Ok(QoS::AtMostOnce));
        assert_eq!(QoS::try_from(1), Ok(QoS::AtLeastOnce));
        assert_eq!(QoS::try_from(2), Ok(QoS::ExactlyOnce));
        assert_eq!(QoS::try_from(3), Err(InvalidQos(3)));
    }
}
