//! Minimal plain-HTTP client for fetching an upstream body.
//!
//! Requests are sent as `HTTP/1.0` with `Connection: close`, so the upstream
//! answers with an unframed body that ends when the connection does.

use std::time::Duration;

use anyhow::{Context, Result};
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::http::headers::Headers;
use crate::http::response::StatusCode;

/// Largest response head accepted from the upstream
const MAX_HEAD_SIZE: usize = 64 * 1024;
const HEAD_READ_SIZE: usize = 8192;

/// A plain-HTTP upstream server.
#[derive(Debug, Clone)]
pub struct Upstream {
    addr: String,
    host: String,
    base_path: String,
    connect_timeout: Duration,
    request_timeout: Duration,
}

/// Response head plus the still-open body stream.
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: Headers,
    stream: TcpStream,
    buffered: BytesMut,
    request_timeout: Duration,
}

impl Upstream {
    pub fn new(base_url: &str, connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let url = url::Url::parse(base_url).context("Invalid upstream URL")?;
        if url.scheme() != "http" {
            anyhow::bail!("unsupported upstream scheme {:?}, only http is supported", url.scheme());
        }

        let host = url.host_str().context("Upstream URL missing host")?;
        let port = url.port_or_known_default().unwrap_or(80);

        let host_header = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            addr: format!("{}:{}", host, port),
            host: host_header,
            base_path: url.path().trim_end_matches('/').to_string(),
            connect_timeout,
            request_timeout,
        })
    }

    /// Builds the request bytes sent for `path`.
    pub fn build_request(&self, path: &str) -> Vec<u8> {
        let path = if path.is_empty() { "/" } else { path };

        format!(
            "GET {}{} HTTP/1.0\r\nHost: {}\r\nConnection: close\r\nAccept: */*\r\n\r\n",
            self.base_path, path, self.host
        )
        .into_bytes()
    }

    /// Sends a GET for `path` and reads the response head.
    pub async fn get(&self, path: &str) -> Result<UpstreamResponse> {
        let mut stream = timeout(self.connect_timeout, TcpStream::connect(&self.addr))
            .await
            .context("Connection timeout")?
            .with_context(|| format!("Failed to connect to upstream {}", self.addr))?;

        tracing::trace!(upstream = %self.addr, path, "Connected to upstream");

        stream.write_all(&self.build_request(path)).await?;
        stream.flush().await?;

        let (status, headers, buffered) = timeout(self.request_timeout, read_head(&mut stream))
            .await
            .context("Request timeout")??;

        Ok(UpstreamResponse {
            status,
            headers,
            stream,
            buffered,
            request_timeout: self.request_timeout,
        })
    }
}

impl UpstreamResponse {
    /// Returns up to `max` body bytes, or `None` once the upstream is done.
    pub async fn next_chunk(&mut self, max: usize) -> Result<Option<Bytes>> {
        if !self.buffered.is_empty() {
            let n = self.buffered.len().min(max);
            return Ok(Some(self.buffered.split_to(n).freeze()));
        }

        let mut chunk = vec![0u8; max];
        let n = timeout(self.request_timeout, self.stream.read(&mut chunk))
            .await
            .context("Request timeout")??;

        if n == 0 {
            return Ok(None);
        }
        chunk.truncate(n);
        Ok(Some(Bytes::from(chunk)))
    }
}

/// Reads until the blank line ending the head; returns any body bytes read
/// past it.
async fn read_head(stream: &mut TcpStream) -> Result<(StatusCode, Headers, BytesMut)> {
    let mut buffer = BytesMut::with_capacity(HEAD_READ_SIZE);

    loop {
        if let Some(end) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = buffer.split_to(end + 4);
            let (status, headers) = parse_head(&head)?;
            return Ok((status, headers, buffer));
        }

        if buffer.len() > MAX_HEAD_SIZE {
            anyhow::bail!("Upstream response head too large");
        }

        let n = stream.read_buf(&mut buffer).await?;
        if n == 0 {
            anyhow::bail!("Upstream closed before complete response head");
        }
    }
}

fn parse_head(head: &[u8]) -> Result<(StatusCode, Headers)> {
    let head = std::str::from_utf8(head).context("Invalid UTF-8 in upstream response head")?;
    let mut lines = head.split("\r\n");

    let status_line = lines.next().context("Empty upstream response")?;
    let code = status_line
        .splitn(3, ' ')
        .nth(1)
        .with_context(|| format!("Invalid status line: {}", status_line))?
        .parse::<u16>()
        .context("Invalid status code")?;

    let mut headers = Headers::new();
    for line in lines.take_while(|l| !l.is_empty()) {
        if let Some((name, value)) = line.split_once(':') {
            headers.append(name.trim(), value.trim());
        }
    }

    Ok((StatusCode::from_u16(code), headers))
}
