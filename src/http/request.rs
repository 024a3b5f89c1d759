use crate::http::headers::Headers;

/// The first line of a request: `METHOD SP TARGET SP HTTP/VERSION`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestLine {
    /// Upper-case method token, e.g. `"GET"`
    pub method: String,
    /// Request target, always starting with `/`
    pub target: String,
    /// `"1.0"` or `"1.1"`, without the `HTTP/` prefix
    pub http_version: String,
}

/// Where the incremental parser currently is within a message.
///
/// Transitions only move forward:
///
/// ```text
/// ParsingRequestLine -> ParsingHeaders -> ParsingBody -> Done
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParserState {
    #[default]
    ParsingRequestLine,
    ParsingHeaders,
    ParsingBody,
    Done,
}

/// A parsed HTTP request.
///
/// Built incrementally by [`Request::parse`]; the readers in
/// [`crate::http::parser`] only hand it out once the parser reached
/// [`ParserState::Done`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub request_line: RequestLine,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub(crate) state: ParserState,
}

impl Request {
    /// Creates an empty request waiting for its request line.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == ParserState::Done
    }

    pub fn method(&self) -> &str {
        &self.request_line.method
    }

    pub fn target(&self) -> &str {
        &self.request_line.target
    }

    /// Retrieves a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }
}
