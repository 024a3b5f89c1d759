//! HTTP/1.1 protocol implementation.
//!
//! # Architecture
//!
//! - **`headers`**: case-insensitive header collection and single-line parsing
//! - **`request`**: the parsed request and its parser state
//! - **`parser`**: incremental request parsing from arbitrary byte chunks
//! - **`writer`**: ordered response writing, including chunked bodies and trailers
//! - **`response`**: status codes, default headers and the handler's sink
//! - **`connection`**: per-connection state machine driving the above
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Parse request from the socket
//!        └──────┬──────┘
//!               │ Request parsed (or 400 rendered)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Run the handler
//!        └──────┬───────────┘
//!               │ Response bytes ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send response to client
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │    Closed        │
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use httpwire::http::request::Request;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:42069").await?;
//!     let (mut socket, _addr) = listener.accept().await?;
//!     let req = Request::from_reader(&mut socket).await?;
//!     println!("{} {}", req.method(), req.target());
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

pub use headers::{HeaderError, Headers};
pub use parser::ParseError;
pub use request::{ParserState, Request, RequestLine};
pub use response::{ResponseBuffer, StatusCode, default_headers};
pub use writer::{BodyMode, ResponseWriter, WriterError, WriterState};
