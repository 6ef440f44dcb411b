//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     (method, pattern, handler)
//!     → pattern.rs (split into segments)
//!     → trie.rs (insert into the method's tree)
//!     → router.rs (store handler under method + pattern)
//!
//! Lookup (per request):
//!     (method, path)
//!     → pattern.rs (split path)
//!     → trie.rs (literal-first depth-first search)
//!     → router.rs (bind params against matched pattern)
//!     → Return: RouteMatch or None
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, read-only while serving
//! - No regex: literal, `:name` and trailing `*name` segments only
//! - Deterministic: literal beats named beats nothing, per level

pub mod params;
pub mod pattern;
pub mod router;
pub mod trie;

pub use params::Params;
pub use router::{RouteMatch, Router};
