use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{ParserConfig, ServerConfig};
use crate::http::connection::Connection;
use crate::server::handler::Handler;

/// Pause before accepting again after a failed accept.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A running server.
///
/// Accepting starts as soon as [`Server::serve`] returns and continues until
/// [`Server::close`] is called or the server is dropped.
pub struct Server {
    local_addr: SocketAddr,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
    accept_loop: Mutex<Option<JoinHandle<()>>>,
}

impl Server {
    /// Binds `config.listen_addr` and starts accepting connections.
    pub async fn serve<H: Handler>(
        config: &ServerConfig,
        parser: &ParserConfig,
        handler: H,
    ) -> anyhow::Result<Server> {
        let listener = TcpListener::bind(&config.listen_addr)
            .await
            .with_context(|| format!("failed to listen on {}", config.listen_addr))?;
        let local_addr = listener.local_addr()?;
        info!("Listening on {}", local_addr);

        let closed = Arc::new(AtomicBool::new(false));
        let shutdown = Arc::new(Notify::new());

        let accept_loop = tokio::spawn(run(
            listener,
            Arc::new(handler),
            parser.clone(),
            Arc::clone(&closed),
            Arc::clone(&shutdown),
        ));

        Ok(Server {
            local_addr,
            closed,
            shutdown,
            accept_loop: Mutex::new(Some(accept_loop)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stops accepting and releases the listening socket.
    ///
    /// Only the first call does anything; later or concurrent calls return
    /// `Ok(())` immediately. Connections already being served run to
    /// completion in their own tasks.
    pub async fn close(&self) -> anyhow::Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.shutdown.notify_one();

        let accept_loop = self
            .accept_loop
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if let Some(accept_loop) = accept_loop {
            accept_loop.await.context("accept loop panicked")?;
        }

        info!("Server on {} closed", self.local_addr);
        Ok(())
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.shutdown.notify_one();
        }
    }
}

async fn run<H: Handler>(
    listener: TcpListener,
    handler: Arc<H>,
    parser: ParserConfig,
    closed: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    loop {
        let accepted = tokio::select! {
            _ = shutdown.notified() => break,
            res = listener.accept() => res,
        };

        let (socket, peer) = match accepted {
            Ok(conn) => conn,
            Err(e) => {
                if closed.load(Ordering::Acquire) {
                    break;
                }
                tracing::error!("Failed to accept connection: {}", e);
                if shutdown_during_backoff(&shutdown).await {
                    break;
                }
                continue;
            }
        };
        tracing::debug!("Accepted connection from {}", peer);

        let handler = Arc::clone(&handler);
        let parser = parser.clone();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, peer, handler, parser);
            if let Err(e) = conn.run().await {
                tracing::error!("Connection error from {}: {:#}", peer, e);
            }
        });
    }
    // listener dropped here, which closes the socket
}

/// Waits `ACCEPT_BACKOFF` so persistent accept errors (EMFILE) do not spin.
/// Returns true if shutdown was requested meanwhile.
async fn shutdown_during_backoff(shutdown: &Notify) -> bool {
    tokio::select! {
        _ = shutdown.notified() => true,
        _ = tokio::time::sleep(ACCEPT_BACKOFF) => false,
    }
}
