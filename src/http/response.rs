use std::fmt;

use crate::http::headers::Headers;
use crate::http::writer::{ResponseWriter, WriterError, WriterState};

/// HTTP status code.
///
/// Any code can be sent; only the common ones carry a reason phrase:
/// - `OK` (200)
/// - `BAD_REQUEST` (400)
/// - `INTERNAL_SERVER_ERROR` (500)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    pub const fn from_u16(code: u16) -> Self {
        StatusCode(code)
    }

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpwire::http::response::StatusCode;
    /// assert_eq!(StatusCode::OK.as_u16(), 200);
    /// assert_eq!(StatusCode::from_u16(404).as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Returns the reason phrase, or an empty string for codes without one.
    ///
    /// # Example
    ///
    /// ```
    /// # use httpwire::http::response::StatusCode;
    /// assert_eq!(StatusCode::BAD_REQUEST.reason_phrase(), "Bad Request");
    /// assert_eq!(StatusCode::from_u16(418).reason_phrase(), "");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            400 => "Bad Request",
            500 => "Internal Server Error",
            _ => "",
        }
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}

/// Headers sent with every server-generated response.
pub fn default_headers(content_len: usize) -> Headers {
    let mut headers = Headers::new();
    headers.insert("Content-Length", content_len.to_string());
    headers.insert("Connection", "close");
    headers.insert("Content-Type", "text/plain");
    headers
}

/// Serializes a complete plain-body response.
pub async fn render_response(
    status: StatusCode,
    headers: &Headers,
    body: &[u8],
) -> Result<Vec<u8>, WriterError> {
    let mut writer = ResponseWriter::new(Vec::with_capacity(body.len() + 128));
    writer.write_status_line(status).await?;
    writer.write_headers(headers).await?;
    writer.write_body(body).await?;
    Ok(writer.into_inner())
}

/// Output sink handed to request handlers.
///
/// A handler either writes body bytes (through [`ResponseBuffer::write`] or
/// `std::io::Write`) and lets the server wrap them in a `200 OK`, or takes
/// over completely through [`ResponseBuffer::writer`].
///
/// # Example
///
/// ```ignore
/// sink.set_header("Content-Type", "text/html");
/// sink.write(b"<h1>hello</h1>");
/// ```
#[derive(Debug)]
pub struct ResponseBuffer {
    body: Vec<u8>,
    overrides: Headers,
    writer: ResponseWriter<Vec<u8>>,
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self {
            body: Vec::new(),
            overrides: Headers::new(),
            writer: ResponseWriter::new(Vec::new()),
        }
    }

    /// Appends bytes to the body of the default response.
    pub fn write(&mut self, bytes: impl AsRef<[u8]>) {
        self.body.extend_from_slice(bytes.as_ref());
    }

    /// Sets a header on the default response, replacing the server default.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.overrides.insert(name, value);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Writer for a fully custom response.
    ///
    /// Once its status line is written, the server sends the writer's output
    /// verbatim and ignores buffered body bytes and header overrides.
    pub fn writer(&mut self) -> &mut ResponseWriter<Vec<u8>> {
        &mut self.writer
    }

    /// True once the handler started a custom response.
    pub fn is_custom(&self) -> bool {
        self.writer.state() != WriterState::Init
    }

    /// Produces the bytes to send on the wire.
    pub async fn into_response(self) -> Result<Vec<u8>, WriterError> {
        if self.is_custom() {
            if !self.writer.is_complete() {
                return Err(WriterError::Unfinished(self.writer.state()));
            }
            if !self.body.is_empty() {
                tracing::warn!(
                    discarded = self.body.len(),
                    "handler wrote body bytes alongside a custom response"
                );
            }
            return Ok(self.writer.into_inner());
        }

        let mut headers = default_headers(self.body.len());
        headers.overwrite_with(&self.overrides);

        render_response(StatusCode::OK, &headers, &self.body).await
    }
}

impl std::io::Write for ResponseBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
