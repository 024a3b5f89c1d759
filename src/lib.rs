//! httpwire - HTTP/1.1 from raw bytes
//!
//! Incremental request parsing, ordered response writing (including chunked
//! bodies and trailers) and a task-per-connection server.

pub mod config;
pub mod http;
pub mod proxy;
pub mod server;
