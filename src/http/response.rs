//! Response sink handed to handlers through the dispatch context.
//!
//! # Responsibilities
//! - Collect headers, status and body written by the handler chain
//! - Convert the result into an axum response for the transport
//!
//! # Design Decisions
//! - The status line is written once; later writes are ignored and logged
//! - Writing body bytes without a status commits `200 OK`
//! - Headers set after the status is committed are dropped, as on the wire

use axum::body::Body;
use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::StatusCode;
use axum::response::Response;

/// Buffered, write-once-status response.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any previous value.
    pub fn set_header(&mut self, key: &str, value: &str) {
        if self.status.is_some() {
            tracing::warn!(header = %key, "Header set after status was written; ignored");
            return;
        }
        match (HeaderName::try_from(key), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = %key, "Invalid header dropped"),
        }
    }

    /// Commit the status line. Only the first call takes effect.
    pub fn write_status(&mut self, status: StatusCode) {
        match self.status {
            Some(current) => tracing::warn!(
                current = current.as_u16(),
                ignored = status.as_u16(),
                "Superfluous status write"
            ),
            None => self.status = Some(status),
        }
    }

    /// Append body bytes, committing `200 OK` if no status was written.
    pub fn write(&mut self, bytes: &[u8]) {
        if self.status.is_none() {
            self.status = Some(StatusCode::OK);
        }
        self.body.extend_from_slice(bytes);
    }

    /// Committed status, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Whether a status line has been committed.
    pub fn is_written(&self) -> bool {
        self.status.is_some()
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status.unwrap_or(StatusCode::OK);
        *response.headers_mut() = self.headers;
        response
    }
}
