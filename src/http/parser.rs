use tokio::io::{AsyncRead, AsyncReadExt};

use crate::config::ParserConfig;
use crate::http::headers::{HeaderError, find_crlf};
use crate::http::request::{ParserState, Request, RequestLine};

const SUPPORTED_VERSIONS: [&str; 2] = ["1.1", "1.0"];

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid request line")]
    InvalidRequestLine,
    #[error("invalid http method: {0:?}")]
    InvalidMethod(String),
    #[error("invalid http version: {0:?}")]
    InvalidVersion(String),
    #[error("invalid request target: {0:?}")]
    InvalidTarget(String),
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("invalid content length: {0:?}")]
    InvalidContentLength(String),
    #[error("body longer than content length")]
    BodyTooLong,
    #[error("content length {length} exceeds limit of {limit} bytes")]
    BodyTooLarge { length: usize, limit: usize },
    #[error("request line or header exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },
    #[error("incomplete request")]
    Incomplete,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// True for failures caused by the transport rather than the bytes sent.
    pub fn is_io(&self) -> bool {
        matches!(self, ParseError::Io(_))
    }
}

impl Request {
    /// Reads and parses a request using the default [`ParserConfig`].
    pub async fn from_reader<R>(reader: &mut R) -> Result<Request, ParseError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        Self::from_reader_with(reader, &ParserConfig::default()).await
    }

    /// Reads from `reader` until a full request has been parsed.
    ///
    /// Bytes are read into a window of `initial_buffer_size` bytes that
    /// doubles, up to `max_buffer_size`, whenever unparsed data fills it.
    /// Parsed bytes are shifted out after each read, so the window only has
    /// to hold the longest single line, CRLF included. A full window at
    /// `max_buffer_size` is [`ParseError::HeadTooLarge`]. End of stream
    /// before the request is complete is an error.
    pub async fn from_reader_with<R>(
        reader: &mut R,
        config: &ParserConfig,
    ) -> Result<Request, ParseError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut request = Request::new();
        let mut length_checked = false;

        let max_window = config.max_buffer_size.max(1);
        let mut buf = vec![0u8; config.initial_buffer_size.clamp(1, max_window)];
        let mut filled = 0;

        while !request.is_done() {
            if filled == buf.len() {
                if buf.len() >= max_window {
                    return Err(ParseError::HeadTooLarge {
                        limit: config.max_buffer_size,
                    });
                }
                let grown = (buf.len() * 2).min(max_window);
                buf.resize(grown, 0);
            }

            let n = reader.read(&mut buf[filled..]).await?;
            if n == 0 {
                tracing::trace!(state = ?request.state, "stream ended mid-request");
                return Err(ParseError::Incomplete);
            }
            filled += n;

            let consumed = request.parse(&buf[..filled])?;

            if !length_checked && request.state >= ParserState::ParsingBody {
                if let Some(length) = request.content_length()? {
                    if length > config.max_body_size {
                        return Err(ParseError::BodyTooLarge {
                            length,
                            limit: config.max_body_size,
                        });
                    }
                }
                length_checked = true;
            }

            if consumed > 0 {
                buf.copy_within(consumed..filled, 0);
                filled -= consumed;
            }
        }

        Ok(request)
    }

    /// Parses as much of `data` as possible and returns the bytes consumed.
    ///
    /// Stops once the request is done or a step needs more input. Unconsumed
    /// bytes must be passed again, followed by newly read data.
    pub fn parse(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        let mut total = 0;

        while self.state != ParserState::Done {
            let n = self.parse_single(&data[total..])?;
            total += n;

            if n == 0 {
                break;
            }
        }

        Ok(total)
    }

    fn parse_single(&mut self, data: &[u8]) -> Result<usize, ParseError> {
        match self.state {
            ParserState::ParsingRequestLine => {
                let Some((line, n)) = parse_request_line(data)? else {
                    return Ok(0);
                };
                self.request_line = line;
                self.state = ParserState::ParsingHeaders;
                Ok(n)
            }

            ParserState::ParsingHeaders => {
                let (n, done) = self.headers.parse_line(data)?;
                if done {
                    self.state = ParserState::ParsingBody;
                }
                Ok(n)
            }

            ParserState::ParsingBody => {
                let Some(content_length) = self.content_length()? else {
                    self.state = ParserState::Done;
                    return Ok(0);
                };

                let remaining = content_length.saturating_sub(self.body.len());
                if remaining == 0 {
                    self.state = ParserState::Done;
                    return Ok(0);
                }

                if data.len() > remaining {
                    return Err(ParseError::BodyTooLong);
                }

                self.body.extend_from_slice(data);
                if self.body.len() == content_length {
                    self.state = ParserState::Done;
                }
                Ok(data.len())
            }

            ParserState::Done => Ok(0),
        }
    }

    /// Declared body length, `None` when no `Content-Length` was sent.
    pub fn content_length(&self) -> Result<Option<usize>, ParseError> {
        let Some(raw) = self.headers.get("content-length") else {
            return Ok(None);
        };

        raw.parse()
            .map(Some)
            .map_err(|_| ParseError::InvalidContentLength(raw.to_string()))
    }
}

/// Parses a request line from the front of `data`.
///
/// Returns `Ok(None)` until a full CRLF-terminated line is buffered.
fn parse_request_line(data: &[u8]) -> Result<Option<(RequestLine, usize)>, ParseError> {
    let Some(line_end) = find_crlf(data) else {
        return Ok(None);
    };

    let line =
        std::str::from_utf8(&data[..line_end]).map_err(|_| ParseError::InvalidRequestLine)?;

    let parts: Vec<&str> = line.split(' ').collect();
    let [method, target, version] = parts[..] else {
        return Err(ParseError::InvalidRequestLine);
    };

    if method.is_empty() || !method.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(ParseError::InvalidMethod(method.to_string()));
    }

    let http_version = version
        .strip_prefix("HTTP/")
        .filter(|v| SUPPORTED_VERSIONS.contains(v))
        .ok_or_else(|| ParseError::InvalidVersion(version.to_string()))?;

    if !target.starts_with('/') {
        return Err(ParseError::InvalidTarget(target.to_string()));
    }

    let request_line = RequestLine {
        method: method.to_string(),
        target: target.to_string(),
        http_version: http_version.to_string(),
    };

    Ok(Some((request_line, line_end + 2)))
}
