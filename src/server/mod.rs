//! Connection-accepting server.
//!
//! [`Server::serve`] binds a listener and spawns an accept loop; every
//! accepted connection is driven by its own task through
//! [`crate::http::connection::Connection`]. [`Server::close`] is safe to call
//! from several places (a signal handler and normal teardown, say): the first
//! call wins.

pub mod handler;
pub mod listener;

pub use handler::{Handler, HandlerError, HandlerFn, handler_fn};
pub use listener::Server;

/// Resolves when the process receives SIGINT or SIGTERM (Ctrl-C elsewhere).
pub async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}
