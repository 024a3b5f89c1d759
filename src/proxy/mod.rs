//! Upstream streaming handler.
//!
//! Forwards a request to a plain-HTTP upstream and relays the body back as a
//! chunked response, followed by trailers carrying the SHA-256 and length of
//! everything relayed.

pub mod upstream;

use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::config::ProxyConfig;
use crate::http::headers::Headers;
use crate::http::request::Request;
use crate::http::response::{ResponseBuffer, default_headers};
use crate::server::handler::{Handler, HandlerError};

pub use upstream::{Upstream, UpstreamResponse};

pub const SHA256_TRAILER: &str = "X-Content-SHA256";
pub const LENGTH_TRAILER: &str = "X-Content-Length";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ProxyHandler {
    upstream: Upstream,
    prefix: String,
    chunk_size: usize,
}

impl ProxyHandler {
    pub fn new(config: &ProxyConfig) -> anyhow::Result<Self> {
        Ok(Self {
            upstream: Upstream::new(&config.upstream, CONNECT_TIMEOUT, REQUEST_TIMEOUT)?,
            prefix: config.prefix.trim_end_matches('/').to_string(),
            chunk_size: config.read_chunk_size,
        })
    }

    /// True when `target` falls under the proxied prefix.
    pub fn matches(&self, target: &str) -> bool {
        target
            .strip_prefix(&self.prefix)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    fn upstream_path<'a>(&self, target: &'a str) -> &'a str {
        target.strip_prefix(&self.prefix).unwrap_or(target)
    }
}

impl Handler for ProxyHandler {
    async fn call(&self, sink: &mut ResponseBuffer, req: &Request) -> Result<(), HandlerError> {
        let path = self.upstream_path(req.target());

        let mut upstream = self
            .upstream
            .get(path)
            .await
            .map_err(|e| HandlerError::internal(format!("{:#}", e)))?;

        tracing::debug!(path, status = upstream.status.as_u16(), "Relaying upstream body");

        let mut headers = default_headers(0);
        headers.remove("content-length");
        if let Some(content_type) = upstream.headers.get("content-type") {
            headers.insert("Content-Type", content_type);
        }
        headers.insert("Transfer-Encoding", "chunked");
        headers.insert("Trailer", format!("{}, {}", SHA256_TRAILER, LENGTH_TRAILER));

        let writer = sink.writer();
        writer.write_status_line(upstream.status).await?;
        writer.write_headers(&headers).await?;

        let mut hasher = Sha256::new();
        let mut relayed = 0usize;

        while let Some(chunk) = upstream
            .next_chunk(self.chunk_size)
            .await
            .map_err(|e| HandlerError::internal(format!("{:#}", e)))?
        {
            hasher.update(&chunk);
            relayed += chunk.len();
            writer.write_chunk(&chunk).await?;
        }

        writer.finish_chunked().await?;

        let mut trailers = Headers::new();
        trailers.insert(SHA256_TRAILER, format!("{:x}", hasher.finalize()));
        trailers.insert(LENGTH_TRAILER, relayed.to_string());
        writer.write_trailers(&trailers).await?;

        tracing::info!(path, bytes = relayed, "Relayed upstream body");
        Ok(())
    }
}
