use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use thiserror::Error;

use crate::http::request::{header_ignore_case, Method, Request, Target};
use crate::http::response::StatusCode;

/// Capacity of the header buffer. The header block, separator included, must
/// fit in it.
pub const BUFFER_CAPACITY: usize = 8192;

const SEPARATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no header separator found")]
    NoHeaderSeparator,

    #[error("header block exceeds {limit} bytes")]
    HeaderTooLarge { limit: usize },

    #[error("header block is not valid UTF-8")]
    InvalidEncoding,

    #[error("invalid method")]
    InvalidMethod,

    #[error("invalid URI: {0}")]
    InvalidUri(String),

    #[error("unsupported version")]
    UnsupportedVersion,

    #[error("obsolete line folding in header")]
    ObsoleteLineFolding,

    #[error("invalid header format")]
    MalformedHeader,

    #[error("invalid header field name: {0:?}")]
    InvalidHeaderName(String),

    #[error("Content-Length required")]
    ContentLengthRequired,

    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),

    #[error("Content-Length exceeds actual body size ({received} of {expected} bytes)")]
    TruncatedBody { expected: usize, received: usize },
}

impl ParseError {
    /// The status sent back to the client for this failure. Every parse
    /// failure is a client error answered with 400.
    pub fn status(&self) -> StatusCode {
        StatusCode::BadRequest
    }
}

/// Request line and headers of a message whose body may still be in flight.
#[derive(Debug)]
struct RequestHead {
    method: Method,
    target: Target,
    headers: HashMap<String, String>,
}

impl RequestHead {
    fn into_request(self, body: Option<Bytes>) -> Request {
        Request {
            method: self.method,
            target: self.target,
            headers: self.headers,
            body,
        }
    }
}

#[derive(Debug)]
enum State {
    /// Waiting for `\r\n\r\n`.
    Head,
    /// Head parsed, waiting for `length` body bytes.
    Body { head: RequestHead, length: usize },
}

/// Incremental HTTP/1.x request parser.
///
/// Bytes are pushed in with [`feed`](Self::feed) as they arrive from the
/// socket; the parser keeps everything it has seen so far and reports a
/// request once the head and the declared body are complete. When the peer
/// closes early, [`end_of_stream`](Self::end_of_stream) classifies what was
/// missing.
#[derive(Debug)]
pub struct RequestParser {
    buffer: BytesMut,
    /// Offset up to which the buffer is known not to contain the separator.
    scanned: usize,
    received: usize,
    state: State,
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(BUFFER_CAPACITY),
            scanned: 0,
            received: 0,
            state: State::Head,
        }
    }

    /// Whether any byte has been fed since the last completed request.
    pub fn has_received_data(&self) -> bool {
        self.received > 0
    }

    /// Appends `data` and tries to complete the request.
    ///
    /// Returns `Ok(None)` while more bytes are needed. Once a request is
    /// returned the parser is reset; bytes past the declared body are
    /// discarded.
    pub fn feed(&mut self, data: &[u8]) -> Result<Option<Request>, ParseError> {
        self.received += data.len();
        self.buffer.extend_from_slice(data);

        if let State::Head = self.state {
            let Some(end) = self.find_separator() else {
                if self.buffer.len() >= BUFFER_CAPACITY {
                    return Err(ParseError::HeaderTooLarge { limit: BUFFER_CAPACITY });
                }
                return Ok(None);
            };

            if end + SEPARATOR.len() > BUFFER_CAPACITY {
                return Err(ParseError::HeaderTooLarge { limit: BUFFER_CAPACITY });
            }

            let block = self.buffer.split_to(end + SEPARATOR.len());
            let head = parse_head(&block[..end])?;

            if !head.method.has_body() {
                self.reset();
                return Ok(Some(head.into_request(None)));
            }

            let length = content_length(&head.headers)?;
            self.state = State::Body { head, length };
        }

        let length = match &self.state {
            State::Body { length, .. } => *length,
            State::Head => return Ok(None),
        };
        if self.buffer.len() < length {
            return Ok(None);
        }

        let body = self.buffer.split_to(length).freeze();
        let state = std::mem::replace(&mut self.state, State::Head);
        self.reset();

        match state {
            State::Body { head, .. } => Ok(Some(head.into_request(Some(body)))),
            State::Head => Ok(None),
        }
    }

    /// The error to report when the source ends before a request completed.
    pub fn end_of_stream(&self) -> ParseError {
        match &self.state {
            State::Head => ParseError::NoHeaderSeparator,
            State::Body { length, .. } => ParseError::TruncatedBody {
                expected: *length,
                received: self.buffer.len(),
            },
        }
    }

    fn find_separator(&mut self) -> Option<usize> {
        let start = self.scanned.saturating_sub(SEPARATOR.len() - 1);
        let found = self.buffer[start..]
            .windows(SEPARATOR.len())
            .position(|w| w == SEPARATOR)
            .map(|pos| start + pos);
        if found.is_none() {
            self.scanned = self.buffer.len();
        }
        found
    }

    fn reset(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
        self.received = 0;
        self.state = State::Head;
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses a request from a byte slice that is expected to hold all of it.
pub fn parse_request(buf: &[u8]) -> Result<Request, ParseError> {
    let mut parser = RequestParser::new();
    match parser.feed(buf)? {
        Some(request) => Ok(request),
        None => Err(parser.end_of_stream()),
    }
}

/// Parses header lines (without the terminating blank line) into a map.
///
/// A repeated field name keeps its last value.
pub fn parse_headers<'a, I>(lines: I) -> Result<HashMap<String, String>, ParseError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut headers = HashMap::new();

    for line in lines {
        if line.starts_with([' ', '\t']) {
            return Err(ParseError::ObsoleteLineFolding);
        }

        let (name, value) = line.split_once(':').ok_or(ParseError::MalformedHeader)?;

        if name.is_empty() || !name.bytes().all(is_token_char) {
            return Err(ParseError::InvalidHeaderName(name.to_string()));
        }

        headers.insert(
            name.to_string(),
            value.trim_matches([' ', '\t']).to_string(),
        );
    }

    Ok(headers)
}

fn parse_head(block: &[u8]) -> Result<RequestHead, ParseError> {
    let text = std::str::from_utf8(block).map_err(|_| ParseError::InvalidEncoding)?;
    let mut lines = text.split("\r\n");

    let request_line = lines.next().unwrap_or_default();
    let (method, target) = parse_request_line(request_line)?;
    let headers = parse_headers(lines)?;

    Ok(RequestHead {
        method,
        target,
        headers,
    })
}

fn parse_request_line(line: &str) -> Result<(Method, Target), ParseError> {
    let mut parts = line.splitn(3, ' ');

    let method = parts
        .next()
        .and_then(Method::parse)
        .ok_or(ParseError::InvalidMethod)?;

    let raw_target = parts
        .next()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ParseError::InvalidUri("missing request target".to_string()))?;
    let target = Target::parse(raw_target).map_err(|e| ParseError::InvalidUri(e.to_string()))?;

    let version = parts.next().ok_or(ParseError::UnsupportedVersion)?;
    if !is_supported_version(version) {
        return Err(ParseError::UnsupportedVersion);
    }

    Ok((method, target))
}

/// `HTTP/1.` followed by exactly one digit.
fn is_supported_version(version: &str) -> bool {
    version
        .strip_prefix("HTTP/1.")
        .is_some_and(|minor| minor.len() == 1 && minor.as_bytes()[0].is_ascii_digit())
}

fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

/// Reads the declared body length.
///
/// The exact `Content-Length` key is preferred; when the client spelled the
/// name in another case (`content-length`), that entry is used instead.
fn content_length(headers: &HashMap<String, String>) -> Result<usize, ParseError> {
    let value = header_ignore_case(headers, "Content-Length")
        .ok_or(ParseError::ContentLengthRequired)?;

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidContentLength(value.to_string()));
    }

    value
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidContentLength(value.to_string()))
}
