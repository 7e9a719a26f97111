use log::{debug, error};
use tokio::{
    io::{self, AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};

use crate::packets::OutgoingPacket;

/// Writes packets from the outbound queue to the network.
pub struct Session<W> {
    writer: W,
    rx: mpsc::Receiver<OutgoingPacket>,
}

impl<W: AsyncWrite + Unpin> Session<W> {
    pub fn new(writer: W, rx: mpsc::Receiver<OutgoingPacket>) -> Self {
        Self { writer, rx }
    }

    /// Drain the queue until every sender is dropped.
    ///
    /// Returns the writer, still open, and the number of packets written.
    pub async fn run(mut self) -> io::Result<(W, usize)> {
        let mut written = 0;

        while let Some(packet) = self.rx.recv().await {
            let command = packet.command();
            let bytes = packet.into_bytes();
            debug!("Writing packet: {}", hex::encode(&bytes));

            if let Err(e) = self.writer.write_all(&bytes).await {
                error!("Failed to write packet {command:#04x}: {e}");
                return Err(e);
            }

            if let Err(e) = self.writer.flush().await {
                error!("Failed to flush packet {command:#04x}: {e}");
                return Err(e);
            }

            written += 1;
        }

        Ok((self.writer, written))
    }
}
