use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, warn};

use crate::http::parser::{ParseError, RequestParser, BUFFER_CAPACITY};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::writer::ResponseWriter;
use crate::router::{RouteError, Router};

/// Most unread request bytes discarded after an error response.
const LINGER_LIMIT: usize = 64 * 1024;
/// Longest wait for the peer to stop sending after an error response.
const LINGER_TIMEOUT: Duration = Duration::from_secs(1);

/// A single accepted client connection, serving exactly one request.
pub struct Connection<S> {
    stream: S,
    router: Arc<Router>,
    parser: RequestParser,
    read_timeout: Option<Duration>,
    state: ConnectionState,
    /// Set when the request was rejected and may still have bytes in flight.
    linger: bool,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

/// What a read phase produced.
enum ReadOutcome {
    Request(Request),
    Malformed(ParseError),
    /// The peer closed without sending anything.
    Disconnected,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, router: Arc<Router>) -> Self {
        Self {
            stream,
            router,
            parser: RequestParser::new(),
            read_timeout: None,
            state: ConnectionState::Reading,
            linger: false,
        }
    }

    /// Fails the connection when a single read waits longer than `timeout`.
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Drives the connection from `Reading` to `Closed`.
    ///
    /// Parse failures are answered with an error response; transport
    /// failures abort the cycle and are returned to the caller.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        ReadOutcome::Request(req) => ConnectionState::Processing(req),
                        ReadOutcome::Malformed(err) => {
                            warn!(error = %err, status = err.status().as_u16(), "rejecting malformed request");
                            let response = Response::from_status(err.status());
                            self.linger = true;
                            ConnectionState::Writing(ResponseWriter::new(&response))
                        }
                        ReadOutcome::Disconnected => {
                            debug!("peer closed before sending a request");
                            ConnectionState::Closed
                        }
                    };
                }

                ConnectionState::Processing(req) => {
                    let response = self.dispatch(&req);
                    debug!(
                        method = %req.method,
                        target = %req.target,
                        status = response.status.as_u16(),
                        "request handled"
                    );
                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Writing(mut writer) => {
                    writer.write_to(&mut self.stream).await?;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    // The peer may already be gone; nothing left to report.
                    let _ = self.stream.shutdown().await;
                    if self.linger {
                        self.drain().await;
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        let mut chunk = vec![0u8; BUFFER_CAPACITY];

        loop {
            let n = match self.read_timeout {
                Some(limit) => tokio::time::timeout(limit, self.stream.read(&mut chunk))
                    .await
                    .context("timed out waiting for request data")?,
                None => self.stream.read(&mut chunk).await,
            }
            .context("failed to read request")?;

            if n == 0 {
                if !self.parser.has_received_data() {
                    return Ok(ReadOutcome::Disconnected);
                }
                return Ok(ReadOutcome::Malformed(self.parser.end_of_stream()));
            }

            match self.parser.feed(&chunk[..n]) {
                Ok(Some(request)) => return Ok(ReadOutcome::Request(request)),
                Ok(None) => {}
                Err(err) => return Ok(ReadOutcome::Malformed(err)),
            }
        }
    }

    /// Reads and discards what the peer is still sending, so closing the
    /// socket does not reset it before the error response is delivered.
    /// Stops at EOF, on any error, after `LINGER_LIMIT` bytes or after
    /// `LINGER_TIMEOUT`.
    async fn drain(&mut self) {
        let mut chunk = vec![0u8; BUFFER_CAPACITY];
        let mut discarded = 0;

        let drained = tokio::time::timeout(LINGER_TIMEOUT, async {
            while discarded < LINGER_LIMIT {
                match self.stream.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => discarded += n,
                }
            }
        })
        .await;

        debug!(
            discarded,
            timed_out = drained.is_err(),
            "drained input after error response"
        );
    }

    /// Resolves and runs the handler, converting routing misses into 404 and
    /// handler panics into 500.
    fn dispatch(&self, req: &Request) -> Response {
        let handler = match self.router.resolve_request(req) {
            Ok(handler) => handler,
            Err(err @ RouteError::NoHandler { .. }) => {
                debug!(error = %err, "no route matched");
                return Response::not_found();
            }
            Err(err) => {
                warn!(error = %err, "routing failed");
                return Response::not_found();
            }
        };

        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(req))) {
            Ok(response) => response,
            Err(_) => {
                error!(method = %req.method, path = %req.path(), "handler panicked");
                Response::internal_error()
            }
        }
    }
}
