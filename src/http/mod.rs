//! HTTP/1.x protocol implementation.
//!
//! A deliberately small subset of HTTP/1.1: one request per connection,
//! Content-Length delimited bodies only, no chunked encoding, no keep-alive.
//!
//! # Architecture
//!
//! - **`request`**: `Method`, `Target` and `Request`
//! - **`parser`**: incremental request parser fed straight from the socket
//! - **`response`**: status codes and the `Response` builder
//! - **`writer`**: response serialization and partial-write handling
//! - **`connection`**: the per-connection state machine
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Feed socket bytes to the parser on each wake-up
//!        └──────┬──────┘
//!               │ Request parsed            (malformed → error response)
//!               ▼
//!        ┌──────────────────┐
//!        │   Processing     │ ← Route and run the handler
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Send the whole response
//!        └──────┬───────────┘
//!               │
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │ ← Always; no keep-alive
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use nanohttp::http::connection::Connection;
//! use nanohttp::http::response::Response;
//! use nanohttp::http::request::{Method, Request};
//! use nanohttp::router::Router;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let mut router = Router::new();
//!     router.add_route("/", &[Method::GET], |_: &Request| Response::ok("hello"))?;
//!     let router = Arc::new(router);
//!
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let router = Arc::clone(&router);
//!         tokio::spawn(async move {
//!             if let Err(e) = Connection::new(socket, router).run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
