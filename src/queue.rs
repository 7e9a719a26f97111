use std::fmt;

use tokio::sync::mpsc::{
    self,
    error::{SendError, TrySendError},
};

use crate::packets::OutgoingPacket;

/// Destination of encoded packets waiting to be written to the network.
pub trait OutboundQueue {
    /// Take ownership of `packet`. Must not block.
    fn enqueue(&mut self, packet: OutgoingPacket) -> Result<(), QueueError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue is at capacity.
    Full,

    /// The receiving side has gone away.
    Closed,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Full => "Outbound queue is full",
            Self::Closed => "Outbound queue is closed",
        };

        write!(f, "{value}")
    }
}

impl std::error::Error for QueueError {}

impl OutboundQueue for mpsc::Sender<OutgoingPacket> {
    fn enqueue(&mut self, packet: OutgoingPacket) -> Result<(), QueueError> {
        self.try_send(packet).map_err(|e| match e {
            TrySendError::Full(_) => QueueError::Full,
            TrySendError::Closed(_) => QueueError::Closed,
        })
    }
}

impl OutboundQueue for mpsc::UnboundedSender<OutgoingPacket> {
    fn enqueue(&mut self, packet: OutgoingPacket) -> Result<(), QueueError> {
        self.send(packet).map_err(|SendError(_)| QueueError::Closed)
    }
}
