//! Sends each line typed on stdin as a UDP datagram.

use std::io::Write;

use anyhow::Context;
use httpwire::config::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UdpSocket;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket
        .connect(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("failed to resolve {}", cfg.server.listen_addr))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!(">");
        std::io::stdout().flush()?;

        let Some(mut line) = lines.next_line().await? else {
            break;
        };
        line.push('\n');

        if let Err(e) = socket.send(line.as_bytes()).await {
            tracing::warn!("Failed to send data: {}", e);
        }
    }

    Ok(())
}
