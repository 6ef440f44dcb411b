//! Route groups: a path prefix plus the middleware scoped to it.
//!
//! # Responsibilities
//! - Compose nested prefixes (`/v1` + `/v2` = `/v1/v2`)
//! - Keep the group's middleware in insertion order
//! - Register routes under the group's prefix
//!
//! # Design Decisions
//! - Groups live in the engine's flat, insertion-ordered list; the parent
//!   link is for lookup only and is never walked during dispatch
//! - A `RouteGroup` is a short-lived `&mut Engine` handle, so all
//!   registration happens before the engine is shared for serving

use std::path::PathBuf;

use axum::http::Method;

use crate::dispatch::engine::Engine;
use crate::dispatch::handler::{boxed, BoxedHandler, Handler};
use crate::http::static_files::StaticFiles;

/// Index of a group in its engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub(crate) usize);

impl GroupId {
    /// The engine's own group, prefix `""`.
    pub const ROOT: GroupId = GroupId(0);
}

pub(crate) struct GroupData {
    pub(crate) prefix: String,
    pub(crate) middleware: Vec<BoxedHandler>,
    pub(crate) parent: Option<GroupId>,
}

impl GroupData {
    pub(crate) fn new(prefix: String, parent: Option<GroupId>) -> Self {
        Self {
            prefix,
            middleware: Vec::new(),
            parent,
        }
    }
}

/// Registration handle for one group of an [`Engine`].
pub struct RouteGroup<'e> {
    engine: &'e mut Engine,
    id: GroupId,
}

impl<'e> RouteGroup<'e> {
    pub(crate) fn new(engine: &'e mut Engine, id: GroupId) -> Self {
        Self { engine, id }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Full prefix of this group.
    pub fn prefix(&self) -> &str {
        &self.data().prefix
    }

    pub fn parent(&self) -> Option<GroupId> {
        self.data().parent
    }

    /// Create a child group whose prefix extends this one.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        let full = format!("{}{}", self.prefix(), prefix);
        let id = GroupId(self.engine.groups.len());
        self.engine.groups.push(GroupData::new(full, Some(self.id)));
        RouteGroup::new(self.engine, id)
    }

    /// Append a middleware; middleware run in the order they were added.
    pub fn use_middleware<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.use_boxed(boxed(handler))
    }

    /// Append already type-erased middleware.
    pub fn use_boxed(&mut self, handler: BoxedHandler) -> &mut Self {
        self.engine.groups[self.id.0].middleware.push(handler);
        self
    }

    /// Register `handler` for `method` on `prefix + pattern`.
    pub fn add_route<H: Handler>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self {
        let full = format!("{}{}", self.prefix(), pattern);
        tracing::info!(method = %method, pattern = %full, "Route registered");
        self.engine.router.add_route(method, &full, boxed(handler));
        self
    }

    pub fn get<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.add_route(Method::GET, pattern, handler)
    }

    pub fn post<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.add_route(Method::POST, pattern, handler)
    }

    pub fn put<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.add_route(Method::PUT, pattern, handler)
    }

    pub fn delete<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.add_route(Method::DELETE, pattern, handler)
    }

    pub fn patch<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.add_route(Method::PATCH, pattern, handler)
    }

    pub fn head<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.add_route(Method::HEAD, pattern, handler)
    }

    pub fn options<H: Handler>(&mut self, pattern: &str, handler: H) -> &mut Self {
        self.add_route(Method::OPTIONS, pattern, handler)
    }

    /// Serve files under `root` at `GET <prefix><relative>/*filepath`.
    pub fn static_files(&mut self, relative: &str, root: impl Into<PathBuf>) -> &mut Self {
        let pattern = format!("{}/*filepath", relative.trim_end_matches('/'));
        self.get(&pattern, StaticFiles::new(root))
    }

    fn data(&self) -> &GroupData {
        &self.engine.groups[self.id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_prefixes() {
        let mut engine = Engine::new();
        let mut v1 = engine.group("/v1");
        assert_eq!(v1.prefix(), "/v1");
        let mut v2 = v1.group("/v2");
        assert_eq!(v2.prefix(), "/v1/v2");
        let v3 = v2.group("/v3");
        assert_eq!(v3.prefix(), "/v1/v2/v3");
        assert_eq!(v3.parent(), Some(GroupId(2)));

        // Root group plus three nested ones.
        assert_eq!(engine.group_count(), 4);
    }

    #[test]
    fn test_routes_carry_group_prefix() {
        let mut engine = Engine::new();
        engine
            .group("/api")
            .get("/users/:id", |_: &mut crate::dispatch::Context| {})
            .post("/users", |_: &mut crate::dispatch::Context| {});

        assert_eq!(engine.router().routes(&Method::GET), vec!["/api/users/:id"]);
        assert_eq!(engine.router().routes(&Method::POST), vec!["/api/users"]);
    }

    #[test]
    fn test_static_files_pattern() {
        let mut engine = Engine::new();
        engine.group("/site").static_files("/assets/", "/tmp");
        assert_eq!(
            engine.router().routes(&Method::GET),
            vec!["/site/assets/*filepath"]
        );
    }
}
