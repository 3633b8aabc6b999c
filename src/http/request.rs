use std::collections::HashMap;

use bytes::Bytes;
use thiserror::Error;
use url::Url;

/// Base used to resolve origin-form request targets.
const TARGET_BASE: &str = "http://localhost/";

/// HTTP request methods understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// DELETE - Delete a resource
    DELETE,
}

impl Method {
    /// Every supported method, in declaration order.
    pub const ALL: [Method; 5] = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
    ];

    /// Parses an HTTP method from its wire name.
    ///
    /// Matching is case-sensitive.
    ///
    /// # Example
    ///
    /// ```
    /// # use nanohttp::http::request::Method;
    /// assert_eq!(Method::parse("PATCH"), Some(Method::PATCH));
    /// assert_eq!(Method::parse("patch"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "PATCH" => Some(Method::PATCH),
            "DELETE" => Some(Method::DELETE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
        }
    }

    /// Whether requests with this method carry a Content-Length delimited body.
    pub fn has_body(&self) -> bool {
        matches!(self, Method::POST | Method::PUT | Method::PATCH)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a raw request target was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    #[error("character {0:?} not allowed in a URI")]
    InvalidCharacter(char),

    #[error("malformed percent-encoding at byte {0}")]
    InvalidEscape(usize),

    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// A parsed request target: normalized path plus optional query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    path: String,
    query: Option<String>,
}

impl Target {
    /// Parses an origin-form (`/a/b?x=1`) or absolute-form target.
    ///
    /// Dot segments are resolved, so `/a/./b/../c` becomes `/a/c`, and a
    /// relative path such as `person` is anchored at `/`.
    ///
    /// Only RFC 3986 characters are accepted and every `%` must start a
    /// `%HH` escape; the input is never rewritten into something valid.
    pub fn parse(raw: &str) -> Result<Self, TargetError> {
        validate_uri_chars(raw)?;
        let url = Url::parse(TARGET_BASE)?.join(raw)?;
        Ok(Self {
            path: url.path().to_string(),
            query: url.query().map(str::to_owned),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the first value of a query parameter, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.query {
            Some(query) => write!(f, "{}?{}", self.path, query),
            None => f.write_str(&self.path),
        }
    }
}

/// Checks `raw` against the RFC 3986 character set (unreserved, reserved
/// and `%HH` escapes).
fn validate_uri_chars(raw: &str) -> Result<(), TargetError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
                return Err(TargetError::InvalidEscape(i));
            }
            i += 3;
            continue;
        }
        if !(b.is_ascii_alphanumeric() || b"-._~:/?#[]@!$&'()*+,;=".contains(&b)) {
            let c = raw[i..].chars().next().unwrap_or(char::REPLACEMENT_CHARACTER);
            return Err(TargetError::InvalidCharacter(c));
        }
        i += 1;
    }
    Ok(())
}

/// Represents a parsed HTTP request from a client.
///
/// Header names keep the case the client sent them in; when a name repeats
/// the last value wins. `body` is only present for POST, PUT and PATCH.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method
    pub method: Method,
    /// The request target (path + query)
    pub target: Target,
    /// Request headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// Exactly Content-Length bytes for body-bearing methods
    pub body: Option<Bytes>,
}

/// Builder for constructing Request objects.
pub struct RequestBuilder {
    method: Option<Method>,
    target: Option<String>,
    headers: HashMap<String, String>,
    body: Option<Bytes>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            target: None,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> Result<Request, &'static str> {
        let target = self.target.ok_or("target missing")?;
        Ok(Request {
            method: self.method.ok_or("method missing")?,
            target: Target::parse(&target).map_err(|_| "invalid target")?,
            headers: self.headers,
            body: self.body,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Retrieves a header value by its exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Retrieves a header value, falling back to an ASCII case-insensitive
    /// match when the exact name is absent.
    pub fn header_ignore_case(&self, key: &str) -> Option<&str> {
        header_ignore_case(&self.headers, key)
    }

    pub fn path(&self) -> &str {
        self.target.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.target.query()
    }

    /// The request body, empty when the method carries none.
    pub fn body(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }
}

pub(crate) fn header_ignore_case<'a>(
    headers: &'a HashMap<String, String>,
    key: &str,
) -> Option<&'a str> {
    headers
        .get(key)
        .or_else(|| {
            headers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(key))
                .map(|(_, value)| value)
        })
        .map(|v| v.as_str())
}
