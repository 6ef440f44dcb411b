//! Embeddable HTTP request dispatcher.
//!
//! Routes are kept in one segment trie per HTTP method, with `:name` and
//! `*name` parameters. Route groups add prefix-scoped middleware. Every
//! request runs through a handler chain that middleware drives with
//! `next()` and stops with `abort()`.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod routing;

pub use config::ServerConfig;
pub use dispatch::{Context, Engine, Handler, RouteGroup};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use middleware::{logger, recovery};
