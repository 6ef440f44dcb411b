//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Context (method, path, headers, body)
//!     → engine.rs (collect middleware of every prefix-matching group)
//!     → routing (resolve route, bind params) or 404 handler
//!     → context.rs (run chain: next() / abort())
//!     → ResponseWriter → transport
//! ```
//!
//! # Design Decisions
//! - One handler abstraction for middleware and routes (`Handler`)
//! - Chain execution is plain call-stack recursion, no continuation list
//! - Groups are a naming convenience; dispatch scans them as a flat list

pub mod context;
pub mod engine;
pub mod group;
pub mod handler;

pub use context::Context;
pub use engine::Engine;
pub use group::{GroupId, RouteGroup};
pub use handler::{boxed, BoxedHandler, Handler};
