//! Route registration and lookup.
//!
//! # Responsibilities
//! - Keep one segment trie per HTTP method
//! - Store the handler registered for each (method, pattern)
//! - Resolve a request path to its pattern, handler and parameters
//!
//! # Design Decisions
//! - Roots are created lazily on first registration for a method
//! - Re-registering a (method, pattern) pair silently replaces the handler
//! - Parameters are bound by aligning the *matched pattern* with the request
//!   segments, so only the winning route's names are used
//! - No match is an ordinary outcome (`None`), never an error

use std::collections::HashMap;

use axum::http::Method;

use crate::dispatch::handler::BoxedHandler;
use crate::routing::params::Params;
use crate::routing::pattern::{self, SegmentKind};
use crate::routing::trie::Trie;

/// Outcome of a successful lookup.
#[derive(Clone)]
pub struct RouteMatch<'r> {
    /// The registered pattern that matched.
    pub pattern: &'r str,
    /// Parameters bound from the request path.
    pub params: Params,
    /// Handler registered for the pattern.
    pub handler: BoxedHandler,
}

impl std::fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteMatch")
            .field("pattern", &self.pattern)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Method-keyed collection of route tries plus the handler registry.
#[derive(Default)]
pub struct Router {
    roots: HashMap<Method, Trie>,
    handlers: HashMap<(Method, String), BoxedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `method` requests matching `pattern`.
    pub fn add_route(&mut self, method: Method, pattern: &str, handler: BoxedHandler) {
        let segments = pattern::split(pattern);
        self.roots
            .entry(method.clone())
            .or_default()
            .insert(pattern, &segments);

        if self
            .handlers
            .insert((method.clone(), pattern.to_string()), handler)
            .is_some()
        {
            tracing::debug!(method = %method, pattern = %pattern, "Route handler replaced");
        }
    }

    /// Find the route for `method` and `path`.
    pub fn search(&self, method: &Method, path: &str) -> Option<RouteMatch<'_>> {
        let root = self.roots.get(method)?;
        let path_segments = pattern::split(path);
        let node = root.search(&path_segments)?;
        let matched = root.pattern(node);

        let params = bind_params(matched, &path_segments);
        let handler = self
            .handlers
            .get(&(method.clone(), matched.to_string()))?
            .clone();

        Some(RouteMatch {
            pattern: matched,
            params,
            handler,
        })
    }

    /// Every registered pattern for `method`.
    pub fn routes(&self, method: &Method) -> Vec<&str> {
        self.roots
            .get(method)
            .map(Trie::patterns)
            .unwrap_or_default()
    }

    /// Methods that have at least one route.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.roots.keys()
    }
}

/// Align the segments of `pattern` with the request `path_segments`.
fn bind_params(pattern: &str, path_segments: &[&str]) -> Params {
    let mut params = Params::new();
    for (i, segment) in pattern::split(pattern).into_iter().enumerate() {
        match SegmentKind::of(segment) {
            SegmentKind::Static => {}
            SegmentKind::Named => {
                let name = &segment[1..];
                if let (false, Some(value)) = (name.is_empty(), path_segments.get(i)) {
                    params.insert(name, *value);
                }
            }
            SegmentKind::Wildcard => {
                let name = &segment[1..];
                if !name.is_empty() {
                    let rest = path_segments.get(i..).unwrap_or_default();
                    params.insert(name, rest.join("/"));
                }
                break;
            }
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler::boxed;

    fn noop() -> BoxedHandler {
        boxed(|_: &mut crate::dispatch::Context| {})
    }

    fn test_router() -> Router {
        let mut r = Router::new();
        for p in [
            "/",
            "/hello/tom",
            "/hello/:name",
            "/hello/alice",
            "/hi/:name",
            "/assets/*filepath",
        ] {
            r.add_route(Method::GET, p, noop());
        }
        r
    }

    #[test]
    fn test_static_match_has_no_params() {
        let r = test_router();
        let m = r.search(&Method::GET, "/hello/alice").unwrap();
        assert_eq!(m.pattern, "/hello/alice");
        assert!(m.params.is_empty());
    }

    #[test]
    fn test_precedence() {
        let r = test_router();
        let m = r.search(&Method::GET, "/hello/tom").unwrap();
        assert_eq!(m.pattern, "/hello/tom");

        let m = r.search(&Method::GET, "/hello/bob").unwrap();
        assert_eq!(m.pattern, "/hello/:name");
        assert_eq!(m.params.get("name"), Some("bob"));
    }

    #[test]
    fn test_wildcard_capture() {
        let r = test_router();
        let m = r
            .search(&Method::GET, "/assets/images/2024/may/photo.jpg")
            .unwrap();
        assert_eq!(m.pattern, "/assets/*filepath");
        assert_eq!(m.params.get("filepath"), Some("images/2024/may/photo.jpg"));
    }

    #[test]
    fn test_multiple_named_params() {
        let mut r = Router::new();
        r.add_route(Method::GET, "/users/:user_id/posts/:post_id", noop());
        let m = r.search(&Method::GET, "/users/123/posts/456").unwrap();
        assert_eq!(m.params.get("user_id"), Some("123"));
        assert_eq!(m.params.get("post_id"), Some("456"));
    }

    #[test]
    fn test_unknown_method_and_missing_path() {
        let r = test_router();
        assert!(r.search(&Method::POST, "/hello/tom").is_none());
        assert!(r.search(&Method::GET, "/nowhere/at/all").is_none());
        assert!(r.search(&Method::GET, "/hi").is_none());
    }

    #[test]
    fn test_root_route() {
        let r = test_router();
        assert_eq!(r.search(&Method::GET, "/").unwrap().pattern, "/");
        assert_eq!(r.search(&Method::GET, "").unwrap().pattern, "/");
    }

    #[test]
    fn test_routes_listing() {
        let r = test_router();
        assert_eq!(r.routes(&Method::GET).len(), 6);
        assert!(r.routes(&Method::DELETE).is_empty());
        assert_eq!(r.methods().count(), 1);
    }

    #[test]
    fn test_reregistration_replaces_handler() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let hits = Arc::new(AtomicUsize::new(0));
        let mut r = Router::new();
        r.add_route(Method::GET, "/x", noop());
        let h = Arc::clone(&hits);
        r.add_route(
            Method::GET,
            "/x",
            boxed(move |_: &mut crate::dispatch::Context| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(r.routes(&Method::GET), vec!["/x"]);

        let m = r.search(&Method::GET, "/x").unwrap();
        let mut ctx = crate::dispatch::Context::new(Method::GET, "/x");
        m.handler.call(&mut ctx);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
