//! Built-in middleware.
//!
//! Both are ordinary handlers; install them with `use_middleware`, or get
//! them pre-installed from `Engine::with_defaults` (logger first).

pub mod logger;
pub mod recovery;

pub use logger::logger;
pub use recovery::recovery;
