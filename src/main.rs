use anyhow::Context;
use log::{error, info};
use mqtt_connect::{config::Config, session::Session};
use tokio::{io::AsyncReadExt, net::TcpStream, sync::mpsc};

async fn connect(addr: &str) -> anyhow::Result<TcpStream> {
    TcpStream::connect(addr).await.with_context(|| format!("Failed to connect to {addr}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Connecting to {} as {}...", config.broker_addr, config.client_id);
    let stream = connect(&config.broker_addr).await?;
    let (mut reader, writer) = stream.into_split();

    let (tx, rx) = mpsc::channel(16);
    let session = tokio::spawn(Session::new(writer, rx).run());

    let mut connection = config.connection().build(tx).context("Invalid connection settings")?;
    connection
        .send_connect(config.keep_alive, config.clean_session)
        .context("Failed to send CONNECT")?;
    info!("CONNECT queued with keep alive {}s", connection.keep_alive());

    // Closing the queue lets the session finish once CONNECT is written
    drop(connection);

    // The write half stays open until CONNACK arrives
    let _writer = match session.await.context("Session task failed")? {
        Ok((writer, written)) => {
            info!("Wrote {written} packet(s)");
            writer
        }
        Err(e) => {
            error!("Error writing to {}: {e}", config.broker_addr);
            return Err(e).with_context(|| format!("Failed to write to {}", config.broker_addr));
        }
    };

    let mut connack = [0; 4];
    reader
        .read_exact(&mut connack)
        .await
        .with_context(|| format!("Failed to read CONNACK from {}", config.broker_addr))?;
    info!("Received CONNACK: {}", hex::encode(connack));

    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn connect_failure_names_the_broker() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = connect(&addr).await.unwrap_err();

        assert_eq!(err.to_string(), format!("Failed to connect to {addr}"));
    }
}
