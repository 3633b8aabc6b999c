//! nanohttp - Minimal HTTP/1.1 Server
//!
//! Core library: request parsing, response serialization, routing and the
//! connection event loop.

pub mod config;
pub mod handlers;
pub mod http;
pub mod router;
pub mod server;
