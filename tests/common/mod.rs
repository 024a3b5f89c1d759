#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;

/// Hands out at most `bytes_per_read` bytes per read, like a slow socket.
pub struct ChunkReader {
    data: Vec<u8>,
    bytes_per_read: usize,
    pos: usize,
}

impl ChunkReader {
    pub fn new(data: impl Into<Vec<u8>>, bytes_per_read: usize) -> Self {
        Self {
            data: data.into(),
            bytes_per_read,
            pos: 0,
        }
    }
}

impl AsyncRead for ChunkReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let end = (this.pos + this.bytes_per_read)
            .min(this.data.len())
            .min(this.pos + buf.remaining());

        buf.put_slice(&this.data[this.pos..end]);
        this.pos = end;
        Poll::Ready(Ok(()))
    }
}

/// Sends `request`, closes the write half and reads the whole response.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

/// Splits a raw response into head (without the blank line) and the rest.
pub fn split_head(response: &str) -> (&str, &str) {
    response.split_once("\r\n\r\n").unwrap()
}

/// Decodes a chunked body, returning the payload and what follows the
/// terminating chunk.
pub fn decode_chunked(mut rest: &str) -> (String, &str) {
    let mut payload = String::new();
    loop {
        let (size, after) = rest.split_once("\r\n").unwrap();
        let size = usize::from_str_radix(size, 16).unwrap();
        if size == 0 {
            return (payload, after.strip_prefix("\r\n").unwrap());
        }
        payload.push_str(&after[..size]);
        rest = after[size..].strip_prefix("\r\n").unwrap();
    }
}
