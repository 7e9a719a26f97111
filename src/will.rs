use bytes::Bytes;

use crate::protocol::QoS;

/// Last will message the broker publishes if the connection drops unexpectedly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Will {
    /// Topic to publish the will message to. Must not be empty.
    pub topic: String,

    /// Will message payload. May be empty.
    pub payload: Bytes,

    pub qos: QoS,

    pub retain: bool,
}

impl Will {
    /// Create a will message with `QoS` 0 and no retain.
    pub fn new(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self { topic: topic.into(), payload: payload.into(), qos: QoS::AtMostOnce, retain: false }
    }

    pub fn qos(mut self, qos: QoS) -> Self {
        self.qos = qos;
        self
    }

    pub fn retain(mut self, retain: bool) -> Self {
        self.retain = retain;
        self
    }
}
