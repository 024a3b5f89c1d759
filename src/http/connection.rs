use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::config::ParserConfig;
use crate::http::request::Request;
use crate::http::response::{ResponseBuffer, StatusCode};
use crate::server::handler::{Handler, HandlerError};

/// One accepted client connection.
///
/// Serves exactly one request and then closes; there is no keep-alive.
pub struct Connection<H> {
    stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<H>,
    parser: ParserConfig,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(Vec<u8>),
    Closed,
}

impl<H: Handler> Connection<H> {
    pub fn new(stream: TcpStream, peer: SocketAddr, handler: Arc<H>, parser: ParserConfig) -> Self {
        Self {
            stream,
            peer,
            handler,
            parser,
            state: ConnectionState::Reading,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = self.read_request().await?;
                }

                ConnectionState::Processing(req) => {
                    let response = self.handle_request(&req).await;
                    self.state = ConnectionState::Writing(response);
                }

                ConnectionState::Writing(bytes) => {
                    self.stream
                        .write_all(&bytes)
                        .await
                        .context("writing response")?;
                    self.stream.flush().await.context("flushing response")?;
                }

                ConnectionState::Closed => {
                    // peer may already be gone; nothing left to report
                    let _ = self.stream.shutdown().await;
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<ConnectionState> {
        match Request::from_reader_with(&mut self.stream, &self.parser).await {
            Ok(req) => {
                tracing::debug!(
                    peer = %self.peer,
                    method = %req.method(),
                    target = %req.target(),
                    "request parsed"
                );
                Ok(ConnectionState::Processing(req))
            }

            Err(e) if e.is_io() => Err(anyhow::Error::new(e).context("reading request")),

            Err(e) => {
                tracing::warn!(peer = %self.peer, error = %e, "rejecting malformed request");
                let rejection = HandlerError::new(StatusCode::BAD_REQUEST, e.to_string());
                Ok(ConnectionState::Writing(rejection.render().await?))
            }
        }
    }

    async fn handle_request(&self, req: &Request) -> Vec<u8> {
        let mut sink = ResponseBuffer::new();

        let outcome = match self.handler.call(&mut sink, req).await {
            Ok(()) => sink.into_response().await.map_err(HandlerError::from),
            Err(e) => Err(e),
        };

        let failure = match outcome {
            Ok(bytes) => return bytes,
            Err(e) => e,
        };

        tracing::info!(
            peer = %self.peer,
            status = failure.status.as_u16(),
            message = %failure.message,
            "handler returned an error"
        );

        match failure.render().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(peer = %self.peer, error = %e, "failed to render error response");
                Vec::new()
            }
        }
    }
}
