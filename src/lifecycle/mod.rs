//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     trigger() → every subscriber wakes → server stops accepting → drains
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown of the server
//! ```
//!
//! # Design Decisions
//! - Programmatic and OS-driven shutdown end up on the same path
//! - In-flight requests finish before `HttpServer::run` returns

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
