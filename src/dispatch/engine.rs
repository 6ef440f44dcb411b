//! The dispatcher: turns a request into a handler chain and runs it.
//!
//! # Responsibilities
//! - Own the router and the flat list of route groups
//! - Collect the middleware of every group whose prefix matches the path
//! - Append the matched route handler, or a 404 handler on no match
//! - Start the chain
//!
//! # Design Decisions
//! - Every group is scanned, not only the matched route's ancestors: any
//!   group whose prefix is a literal string prefix of the path contributes
//! - Middleware order = group registration order, then insertion order
//! - The engine is mutated through `&mut self` during setup and shared as
//!   `Arc<Engine>` while serving, so registration cannot race with traffic

use std::path::Path;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use minijinja::Environment;

use crate::dispatch::context::Context;
use crate::dispatch::group::{GroupData, GroupId, RouteGroup};
use crate::dispatch::handler::{boxed, BoxedHandler, Handler};
use crate::middleware::{logger, recovery};
use crate::routing::Router;

/// Request dispatcher owning its routes, groups and templates.
pub struct Engine {
    pub(crate) router: Router,
    pub(crate) groups: Vec<GroupData>,
    templates: Arc<Environment<'static>>,
}

impl Engine {
    /// An engine with no middleware.
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            groups: vec![GroupData::new(String::new(), None)],
            templates: Arc::new(Environment::new()),
        }
    }

    /// An engine with request logging and panic recovery installed.
    ///
    /// The logger comes first so its timing covers the recovery path too.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.use_middleware(logger()).use_middleware(recovery());
        engine
    }

    /// Handle for the engine's own (root) group.
    pub fn root(&mut self) -> RouteGroup<'_> {
        RouteGroup::new(self, GroupId::ROOT)
    }

    /// Handle for an existing group.
    ///
    /// Returns `None` if `id` does not belong to this engine.
    pub fn group_at(&mut self, id: GroupId) -> Option<RouteGroup<'_>> {
        if id.0 < self.groups.len() {
            Some(RouteGroup::new(self, id))
        } else {
            None
        }
    }

    /// Create a top-level group.
    pub fn group(&mut self, prefix: &str) -> RouteGroup<'_> {
        let id = GroupId(self.groups.len());
        self.groups
            .push(GroupData::new(prefix.to_string(), Some(GroupId::ROOT)));
        RouteGroup::new(self, id)
    }

    pub fn use_middleware<H: Handler>(&mut self, handler: H) -> &mut Self {
        self.root().use_middleware(handler);
        self
    }

    pub fn add_route<H: Handler>(&mut self, method: Method, pattern: &str, handler: H) -> &mut Self {
        self.root().add_route(method, pattern, handler);
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

    pub fn static_files(&mut self, relative: &str, root: impl Into<std::path::PathBuf>) -> &mut Self {
        self.root().static_files(relative, root);
        self
    }

    /// Load HTML templates lazily from `dir`, by file name.
    pub fn load_templates(&mut self, dir: impl AsRef<Path>) -> &mut Self {
        let dir = dir.as_ref();
        tracing::info!(dir = %dir.display(), "Template directory configured");
        self.templates_mut()
            .set_loader(minijinja::path_loader(dir));
        self
    }

    /// Template environment, for registering functions and filters.
    pub fn templates_mut(&mut self) -> &mut Environment<'static> {
        Arc::make_mut(&mut self.templates)
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Number of registered groups, root included.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Assemble the chain for `ctx`: matching middleware, then the route.
    pub fn build_chain(&self, ctx: &mut Context) {
        let mut chain: Vec<BoxedHandler> = self
            .groups
            .iter()
            .filter(|group| ctx.path().starts_with(&group.prefix))
            .flat_map(|group| group.middleware.iter().cloned())
            .collect();

        let matched = self
            .router
            .search(ctx.method(), ctx.path())
            .map(|m| (m.params, m.handler));
        match matched {
            Some((params, handler)) => {
                ctx.set_params(params);
                chain.push(handler);
            }
            None => {
                tracing::debug!(method = %ctx.method(), path = %ctx.path(), "No route matched");
                chain.push(not_found_handler());
            }
        }

        ctx.set_templates(Arc::clone(&self.templates));
        ctx.set_chain(chain);
    }

    /// Dispatch `ctx` through its chain.
    pub fn handle(&self, ctx: &mut Context) {
        self.build_chain(ctx);
        ctx.next();
    }

    /// Log every registered route, grouped by method.
    pub fn log_routes(&self) {
        let mut methods: Vec<&Method> = self.router.methods().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for method in methods {
            for pattern in self.router.routes(method) {
                tracing::info!(method = %method, pattern = %pattern, "Route");
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found_handler() -> BoxedHandler {
    boxed(|ctx: &mut Context| {
        let body = format!("404 NOT FOUND: {}\n", ctx.path());
        ctx.plain(StatusCode::NOT_FOUND, body);
    })
}
