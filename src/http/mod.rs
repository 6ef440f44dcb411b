//! HTTP transport glue.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum catch-all route, tower layers, body buffering)
//!     → request.rs (request ID, query/form decoding)
//!     → dispatch::Engine (handler chain, on the blocking pool)
//!     → response.rs (ResponseWriter → axum Response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::ResponseWriter;
pub use server::{HttpServer, ServeError};
pub use static_files::StaticFiles;
