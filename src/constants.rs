/// Protocol name used by MQTT 3.1.
pub(crate) const PROTOCOL_NAME_V31: &str = "MQIsdp";

/// Protocol name used by MQTT 3.1.1.
pub(crate) const PROTOCOL_NAME_V311: &str = "MQTT";

/// Protocol level byte for MQTT 3.1.
pub(crate) const PROTOCOL_LEVEL_V31: u8 = 3;

/// Protocol level byte for MQTT 3.1.1.
pub(crate) const PROTOCOL_LEVEL_V311: u8 = 4;

/// Protocol level byte for MQTT 5.0.
pub(crate) const PROTOCOL_LEVEL_V5: u8 = 5;

/// CONNECT variable header length for MQTT 3.1.
/// Protocol name (2 + 6) + level + flags + keep alive (2).
pub(crate) const HEADER_LEN_V31: usize = 12;

/// CONNECT variable header length for MQTT 3.1.1.
/// Protocol name (2 + 4) + level + flags + keep alive (2).
pub(crate) const HEADER_LEN_V311: usize = 10;

/// Maximum value the remaining length field can carry.
pub(crate) const MAX_PACKET_SIZE: usize = 268_435_455;

/// Maximum allowed length for a length-prefixed field.
pub(crate) const MAX_STRING_LENGTH: usize = 65_535;

/// Connection request.
/// Sent by: Client to Server.
pub(crate) const CONNECT_PACKET_TYPE: u8 = 0x01;

/// Set on the protocol level byte when a bridge asks the remote broker for a private session.
pub(crate) const BRIDGE_PRIVATE_FLAG: u8 = 0x80;

/// Set on the protocol level byte when a cluster node is meeting a peer for the first time.
pub(crate) const NODE_MEET_FLAG: u8 = 0x40;

/// Number of hex characters in the cluster timestamp field.
pub(crate) const NODE_TIMESTAMP_LEN: usize = 8;

/// Bytes reserved in the payload for the cluster timestamp field (length prefix included).
pub(crate) const NODE_TIMESTAMP_FIELD_LEN: usize = 2 + NODE_TIMESTAMP_LEN;
