//! Path and method routing.
//!
//! Routes are keyed by normalized path, so `/a/./b/../c`, `a/c` and `/a/c`
//! all share one entry. Lookups fall back to per-method default handlers when
//! either the path or the method has no entry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use thiserror::Error;

use crate::http::request::{Method, Request, Target};
use crate::http::response::Response;

/// Produces a response for a parsed request.
pub trait Handler: Send + Sync {
    fn handle(&self, request: &Request) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&Request) -> Response + Send + Sync,
{
    fn handle(&self, request: &Request) -> Response {
        self(request)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no handler found for {method} {path}")]
    NoHandler { method: Method, path: String },

    #[error("invalid route path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
}

type MethodMap = HashMap<Method, Arc<dyn Handler>>;

/// Route table built once before serving and read-only afterwards.
#[derive(Default)]
pub struct Router {
    routes: BTreeMap<String, MethodMap>,
    defaults: MethodMap,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for each of `methods` at `path`, replacing any
    /// handler already registered for the same path and method.
    pub fn add_route<H>(
        &mut self,
        path: &str,
        methods: &[Method],
        handler: H,
    ) -> Result<&mut Self, RouteError>
    where
        H: Handler + 'static,
    {
        let path = normalize_path(path)?;
        let handler: Arc<dyn Handler> = Arc::new(handler);
        let entry = self.routes.entry(path).or_default();
        for method in methods {
            entry.insert(*method, Arc::clone(&handler));
        }
        Ok(self)
    }

    /// Registers a fallback handler for each of `methods`.
    pub fn add_default_handler<H>(&mut self, methods: &[Method], handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        for method in methods {
            self.defaults.insert(*method, Arc::clone(&handler));
        }
        self
    }

    /// Registers a fallback handler for every method.
    pub fn add_default_handler_all<H>(&mut self, handler: H) -> &mut Self
    where
        H: Handler + 'static,
    {
        self.add_default_handler(&Method::ALL, handler)
    }

    /// Finds the handler for `path` and `method`.
    pub fn resolve(&self, path: &str, method: Method) -> Result<Arc<dyn Handler>, RouteError> {
        let path = normalize_path(path)?;
        self.lookup(path, method)
    }

    /// Finds the handler for a parsed request. Its target is already
    /// normalized, so no re-parsing happens here.
    pub fn resolve_request(&self, request: &Request) -> Result<Arc<dyn Handler>, RouteError> {
        self.lookup(request.path().to_string(), request.method)
    }

    /// Number of distinct normalized paths with at least one route.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    fn lookup(&self, path: String, method: Method) -> Result<Arc<dyn Handler>, RouteError> {
        self.routes
            .get(&path)
            .and_then(|methods| methods.get(&method))
            .or_else(|| self.defaults.get(&method))
            .cloned()
            .ok_or(RouteError::NoHandler { method, path })
    }
}

/// Resolves dot segments and anchors the path at `/`. Any query is dropped.
///
/// # Example
///
/// ```
/// # use nanohttp::router::normalize_path;
/// assert_eq!(normalize_path("/a/./b/../c").unwrap(), "/a/c");
/// assert_eq!(normalize_path("person").unwrap(), "/person");
/// ```
pub fn normalize_path(path: &str) -> Result<String, RouteError> {
    Target::parse(path)
        .map(|target| target.path().to_string())
        .map_err(|e| RouteError::InvalidPath {
            path: path.to_string(),
            reason: e.to_string(),
        })
}
