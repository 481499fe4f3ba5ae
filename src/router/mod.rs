//! Exact-match request routing.
//!
//! A flat table keyed by uppercased method concatenated with the path. No
//! pattern matching, no precedence rules: a request either hits its exact
//! key or falls through to the not-found handler.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;

use crate::http::Request;

/// An error returned by a handler. Its rendered message becomes the response
/// body, overriding any handler-supplied body bytes.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// What a handler returns: optional body bytes, a status code, and an
/// optional error.
pub type HandlerResult = (Option<Bytes>, u16, Option<HandlerError>);

/// A request handler, shared across connection tasks.
///
/// Handlers receive the parsed request mutably so they can decorate its
/// header container (e.g. add `Location`); those headers are echoed into the
/// outgoing response.
pub type Handler = Arc<dyn Fn(&mut Request) -> HandlerResult + Send + Sync>;

/// Exact-match dispatch table from (method, path) to handler.
///
/// Built once before the listener loop starts and read-only thereafter; it
/// is shared across connection tasks behind an `Arc` with no lock.
///
/// # Examples
///
/// ```
/// use wireserv::Router;
///
/// let mut router = Router::new();
/// router.add_route("get", "/ping", |_req| (None, 200, None));
/// ```
pub struct Router {
    routes: HashMap<String, Handler>,
    not_found: Handler,
}

impl Router {
    /// Creates a router whose fallback returns a 404 with a
    /// "path not found" error body.
    pub fn new() -> Self {
        Self::with_not_found(default_not_found)
    }

    /// Creates a router with a custom not-found handler.
    pub fn with_not_found<H>(not_found: H) -> Self
    where
        H: Fn(&mut Request) -> HandlerResult + Send + Sync + 'static,
    {
        Self {
            routes: HashMap::new(),
            not_found: Arc::new(not_found),
        }
    }

    /// Registers a handler for a method and path.
    ///
    /// The method is uppercased; the path is taken verbatim. Registering the
    /// same pair twice silently overwrites the earlier handler.
    pub fn add_route<H>(&mut self, method: &str, path: &str, handler: H)
    where
        H: Fn(&mut Request) -> HandlerResult + Send + Sync + 'static,
    {
        let key = format!("{}{path}", method.to_uppercase());
        self.routes.insert(key, Arc::new(handler));
    }

    /// Returns the handler for the request, or the not-found handler.
    ///
    /// The lookup key is the method as received concatenated with the
    /// rendered target — neither side is normalized here.
    pub fn resolve(&self, request: &Request) -> Handler {
        let key = format!("{}{}", request.method(), request.target());
        match self.routes.get(&key) {
            Some(handler) => Arc::clone(handler),
            None => Arc::clone(&self.not_found),
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn default_not_found(_request: &mut Request) -> HandlerResult {
    (None, 404, Some("path not found".into()))
}
