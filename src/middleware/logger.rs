//! Request logging middleware.

use std::time::Instant;

use axum::http::StatusCode;

use crate::dispatch::{Context, Handler};
use crate::observability::metrics;

/// Logs `[status] path in elapsed` after the rest of the chain has run,
/// and records the request in the metrics registry.
pub fn logger() -> impl Handler {
    |ctx: &mut Context| {
        let start = Instant::now();
        ctx.next();

        let status = ctx.response().status().unwrap_or(StatusCode::OK);
        tracing::info!(
            request_id = ctx.request_id().unwrap_or("-"),
            method = %ctx.method(),
            path = %ctx.path(),
            status = status.as_u16(),
            elapsed = ?start.elapsed(),
            "Request handled"
        );
        metrics::record_request(ctx.method().as_str(), status.as_u16(), start);
    }
}
