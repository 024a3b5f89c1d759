use std::future::Future;

use crate::http::request::Request;
use crate::http::response::{ResponseBuffer, StatusCode, default_headers, render_response};
use crate::http::writer::WriterError;

/// Failure reported by a handler, sent back as a complete response with
/// `message` as its body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {message}")]
pub struct HandlerError {
    pub status: StatusCode,
    pub message: String,
}

impl HandlerError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Serializes the error as status line, default headers and body.
    pub async fn render(&self) -> Result<Vec<u8>, WriterError> {
        let body = self.message.as_bytes();
        render_response(self.status, &default_headers(body.len()), body).await
    }
}

impl From<WriterError> for HandlerError {
    fn from(e: WriterError) -> Self {
        HandlerError::internal(e.to_string())
    }
}

/// Application logic invoked once per parsed request.
///
/// Returning `Ok(())` sends whatever the handler put into `sink`: either a
/// `200 OK` wrapping the buffered body, or the custom response written
/// through [`ResponseBuffer::writer`]. Returning an error sends that status
/// and message instead.
pub trait Handler: Send + Sync + 'static {
    fn call(
        &self,
        sink: &mut ResponseBuffer,
        req: &Request,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send;
}

/// Handler built from a synchronous closure. See [`handler_fn`].
#[derive(Debug, Clone, Copy)]
pub struct HandlerFn<F> {
    f: F,
}

/// Adapts a closure into a [`Handler`].
///
/// # Example
///
/// ```
/// use httpwire::server::handler::handler_fn;
///
/// let hello = handler_fn(|sink, _req| {
///     sink.write("hello\n");
///     Ok(())
/// });
/// # let _ = hello;
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: Fn(&mut ResponseBuffer, &Request) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    HandlerFn { f }
}

impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut ResponseBuffer, &Request) -> Result<(), HandlerError> + Send + Sync + 'static,
{
    fn call(
        &self,
        sink: &mut ResponseBuffer,
        req: &Request,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send {
        std::future::ready((self.f)(sink, req))
    }
}
