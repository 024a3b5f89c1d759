use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::Headers;
use crate::http::response::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";
const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

/// Progress through a response.
///
/// ```text
/// Init -> WrittenStatus -> WrittenHeaders -> Done
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Init,
    WrittenStatus,
    WrittenHeaders,
    Done,
}

/// How the body of the response is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// Nothing written after the headers yet.
    Pending,
    Plain,
    Chunked { trailers_allowed: bool },
}

#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error("cannot {operation} in state {state:?}")]
    OutOfOrder {
        operation: &'static str,
        state: WriterState,
    },
    #[error("response left unfinished in state {0:?}")]
    Unfinished(WriterState),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes one response to `sink`, enforcing wire order.
///
/// Every method checks the current state before touching the sink, so an
/// out-of-order call fails without emitting anything.
#[derive(Debug)]
pub struct ResponseWriter<W> {
    sink: W,
    state: WriterState,
    body: BodyMode,
}

impl<W> ResponseWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            state: WriterState::Init,
            body: BodyMode::Pending,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn body_mode(&self) -> BodyMode {
        self.body
    }

    /// True once a body (plain or chunked) has been fully written.
    pub fn is_complete(&self) -> bool {
        self.state == WriterState::Done
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    fn expect_state(&self, expected: WriterState, operation: &'static str) -> Result<(), WriterError> {
        if self.state != expected {
            return Err(WriterError::OutOfOrder {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }
}

impl<W: AsyncWrite + Unpin> ResponseWriter<W> {
    /// Writes `HTTP/1.1 <code> <reason>\r\n`.
    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriterError> {
        self.expect_state(WriterState::Init, "write status line")?;

        let line = format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            status.as_u16(),
            status.reason_phrase()
        );
        self.sink.write_all(line.as_bytes()).await?;

        self.state = WriterState::WrittenStatus;
        Ok(())
    }

    /// Writes the header block, including its terminating blank line.
    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), WriterError> {
        self.expect_state(WriterState::WrittenStatus, "write headers")?;

        self.sink.write_all(&headers.to_block()).await?;

        self.state = WriterState::WrittenHeaders;
        Ok(())
    }

    /// Writes a complete, unframed body. Can only happen once.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<usize, WriterError> {
        self.expect_state(WriterState::WrittenHeaders, "write body")?;
        if self.body != BodyMode::Pending {
            return Err(WriterError::OutOfOrder {
                operation: "write plain body after chunks",
                state: self.state,
            });
        }

        self.sink.write_all(body).await?;

        self.state = WriterState::Done;
        self.body = BodyMode::Plain;
        Ok(body.len())
    }

    /// Writes one chunk as `<hex len>\r\n<data>\r\n`.
    ///
    /// An empty chunk writes nothing, since a zero-length chunk would end the
    /// body; use [`ResponseWriter::finish_chunked`] for that.
    pub async fn write_chunk(&mut self, data: &[u8]) -> Result<usize, WriterError> {
        self.expect_state(WriterState::WrittenHeaders, "write chunk")?;
        self.body = BodyMode::Chunked {
            trailers_allowed: false,
        };

        if data.is_empty() {
            return Ok(0);
        }

        let mut chunk = format!("{:x}\r\n", data.len()).into_bytes();
        chunk.reserve(data.len() + 2);
        chunk.extend_from_slice(data);
        chunk.extend_from_slice(b"\r\n");
        self.sink.write_all(&chunk).await?;

        Ok(data.len())
    }

    /// Writes the terminating zero-length chunk.
    pub async fn finish_chunked(&mut self) -> Result<(), WriterError> {
        self.expect_state(WriterState::WrittenHeaders, "finish chunked body")?;

        self.sink.write_all(LAST_CHUNK).await?;

        self.state = WriterState::Done;
        self.body = BodyMode::Chunked {
            trailers_allowed: true,
        };
        Ok(())
    }

    /// Writes a trailer block after a finished chunked body.
    ///
    /// The response should have announced the fields in a `Trailer` header.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<(), WriterError> {
        let allowed = self.state == WriterState::Done
            && self.body == BodyMode::Chunked { trailers_allowed: true };
        if !allowed {
            return Err(WriterError::OutOfOrder {
                operation: "write trailers",
                state: self.state,
            });
        }

        self.sink.write_all(&trailers.to_block()).await?;

        self.body = BodyMode::Chunked {
            trailers_allowed: false,
        };
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), WriterError> {
        self.sink.flush().await?;
        Ok(())
    }
}
