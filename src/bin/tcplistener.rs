//! Prints every newline-delimited line received over TCP.
//!
//! Connections are served one at a time, in accept order.

use httpwire::config::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    tracing::info!("Listening on {}", cfg.server.listen_addr);

    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("Connection error: {}", e);
                continue;
            }
        };
        tracing::info!("Connection accepted from {}", peer);

        let mut lines = BufReader::new(socket).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => println!("{}", line),
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", peer, e);
                    break;
                }
            }
        }

        tracing::info!("Connection has been closed with {}", peer);
    }
}
