//! Per-request dispatch state and the chain executor.
//!
//! # Responsibilities
//! - Carry the request (method, path, query, headers, body) and the
//!   parameters bound by the router
//! - Hold the handler chain and the cursor into it
//! - Offer the response helpers handlers write through
//!
//! # Chain execution
//! ```text
//! cursor: -1 ──next()──▶ 0 ──next()──▶ 1 ... ──▶ len   (exhausted)
//!                                         abort() ──▶ len
//!
//! M1 pre ─ next() ─▶ M2 pre ─ next() ─▶ H
//!                                       │
//! M1 post ◀──────── M2 post ◀───────────┘
//! ```
//!
//! # Design Decisions
//! - `next()` runs exactly one more handler; a handler that does not call it
//!   cuts off the handlers that have not started yet and moves the cursor
//!   to the chain length
//! - Frames already on the stack always get their post-logic back
//! - The cursor only moves forward and never passes the chain length

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::header::HeaderMap;
use axum::http::request::Parts;
use axum::http::{Method, StatusCode};
use axum::response::Response;
use minijinja::Environment;
use percent_encoding::percent_decode_str;
use serde::Serialize;

use crate::dispatch::handler::BoxedHandler;
use crate::http::request::{is_urlencoded_form, lookup_urlencoded, X_REQUEST_ID};
use crate::http::response::ResponseWriter;
use crate::routing::Params;

/// Mutable state of one request flowing through the handler chain.
pub struct Context {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    params: Params,

    handlers: Vec<BoxedHandler>,
    /// Index of the running handler; `-1` before the chain starts.
    cursor: isize,

    response: ResponseWriter,
    templates: Option<Arc<Environment<'static>>>,
}

impl Context {
    /// Context for a bare method and path, without headers or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p.to_string(), Some(q.to_string())),
            None => (path, None),
        };
        Self {
            method,
            path,
            query,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            params: Params::new(),
            handlers: Vec::new(),
            cursor: -1,
            response: ResponseWriter::new(),
            templates: None,
        }
    }

    /// Context for a request received by the transport.
    ///
    /// The path is percent-decoded before routing. A path that does not
    /// decode to UTF-8 is routed as received.
    pub fn from_request(parts: Parts, body: Bytes) -> Self {
        let raw = parts.uri.path();
        let path = match percent_decode_str(raw).decode_utf8() {
            Ok(decoded) => decoded.into_owned(),
            Err(e) => {
                tracing::debug!(path = %raw, error = %e, "Path is not UTF-8 once decoded");
                raw.to_string()
            }
        };
        let mut ctx = Self::new(parts.method, String::new());
        ctx.path = path;
        ctx.query = parts.uri.query().map(str::to_string);
        ctx.headers = parts.headers;
        ctx.body = body;
        ctx
    }

    // --- request ---------------------------------------------------------

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path parameter bound by `:name` or `*name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// First query string value for `key`.
    pub fn query(&self, key: &str) -> Option<String> {
        lookup_urlencoded(self.query.as_deref()?.as_bytes(), key)
    }

    /// Form value for `key`; an url-encoded body wins over the query string.
    pub fn form_value(&self, key: &str) -> Option<String> {
        if is_urlencoded_form(&self.headers) {
            if let Some(value) = lookup_urlencoded(&self.body, key) {
                return Some(value);
            }
        }
        self.query(key)
    }

    /// Request header as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    // --- chain -----------------------------------------------------------

    /// Advance the cursor and run the handler it lands on, if any.
    ///
    /// Code placed after the call runs once the rest of the chain returned.
    /// A handler that returns without calling `next()` ends the chain.
    pub fn next(&mut self) {
        let len = self.len();
        if self.cursor < len {
            self.cursor += 1;
        }
        let current = self.cursor;
        let handler = usize::try_from(current)
            .ok()
            .and_then(|i| self.handlers.get(i))
            .cloned();
        let Some(handler) = handler else {
            return;
        };

        handler.call(self);
        if self.cursor == current {
            self.cursor = len;
        }
    }

    /// Skip every handler not yet started and answer `{"message": ...}`.
    pub fn abort(&mut self, status: StatusCode, message: impl Into<String>) {
        self.cursor = self.len();
        self.json(status, &serde_json::json!({ "message": message.into() }));
    }

    /// True once the chain is exhausted or aborted.
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.len()
    }

    /// Index of the handler currently running: `-1` before the first,
    /// the chain length once finished.
    pub fn cursor(&self) -> isize {
        self.cursor
    }

    /// Number of handlers in the chain.
    pub fn chain_len(&self) -> usize {
        self.handlers.len()
    }

    fn len(&self) -> isize {
        isize::try_from(self.handlers.len()).unwrap_or(isize::MAX)
    }

    pub(crate) fn set_chain(&mut self, handlers: Vec<BoxedHandler>) {
        self.handlers = handlers;
        self.cursor = -1;
    }

    pub(crate) fn set_params(&mut self, params: Params) {
        self.params = params;
    }

    pub(crate) fn set_templates(&mut self, templates: Arc<Environment<'static>>) {
        self.templates = Some(templates);
    }

    // --- response --------------------------------------------------------

    pub fn status(&mut self, status: StatusCode) {
        self.response.write_status(status);
    }

    pub fn set_header(&mut self, key: &str, value: &str) {
        self.response.set_header(key, value);
    }

    pub fn plain(&mut self, status: StatusCode, text: impl AsRef<str>) {
        self.data(status, "text/plain; charset=utf-8", text.as_ref().as_bytes());
    }

    pub fn html(&mut self, status: StatusCode, html: impl AsRef<str>) {
        self.data(status, "text/html; charset=utf-8", html.as_ref().as_bytes());
    }

    pub fn json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.data(status, "application/json", &bytes),
            Err(e) => {
                tracing::error!(path = %self.path, error = %e, "JSON encoding failed");
                self.cursor = self.len();
                self.plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
            }
        }
    }

    pub fn data(&mut self, status: StatusCode, content_type: &str, bytes: &[u8]) {
        self.response.set_header("content-type", content_type);
        self.response.write_status(status);
        self.response.write(bytes);
    }

    /// Render the named template with `data` as its context.
    pub fn render<T: Serialize>(&mut self, status: StatusCode, name: &str, data: &T) {
        let rendered = match &self.templates {
            Some(env) => env
                .get_template(name)
                .and_then(|template| template.render(data))
                .map_err(|e| e.to_string()),
            None => Err(format!("no templates loaded, cannot render {name}")),
        };
        match rendered {
            Ok(html) => self.html(status, html),
            Err(message) => {
                tracing::error!(template = %name, error = %message, "Template rendering failed");
                self.abort(StatusCode::INTERNAL_SERVER_ERROR, message);
            }
        }
    }

    pub fn response(&self) -> &ResponseWriter {
        &self.response
    }

    pub fn into_response(self) -> Response {
        self.response.into_response()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params)
            .field("cursor", &self.cursor())
            .field("chain_len", &self.handlers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler::boxed;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<String>>>;

    fn wrapping(log: &Log, id: &'static str) -> BoxedHandler {
        let log = Arc::clone(log);
        boxed(move |ctx: &mut Context| {
            log.lock().unwrap().push(format!("{id}-pre"));
            ctx.next();
            log.lock().unwrap().push(format!("{id}-post"));
        })
    }

    fn terminal(log: &Log, id: &'static str) -> BoxedHandler {
        let log = Arc::clone(log);
        boxed(move |ctx: &mut Context| {
            log.lock().unwrap().push(id.to_string());
            ctx.next();
        })
    }

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    #[test]
    fn test_nested_ordering() {
        let log = Log::default();
        let mut ctx = Context::new(Method::GET, "/");
        ctx.set_chain(vec![wrapping(&log, "M1"), wrapping(&log, "M2"), terminal(&log, "H")]);
        assert_eq!(ctx.cursor(), -1);

        ctx.next();
        assert_eq!(entries(&log), ["M1-pre", "M2-pre", "H", "M2-post", "M1-post"]);
        assert_eq!(ctx.cursor(), 3);
        assert!(ctx.is_finished());
    }

    #[test]
    fn test_abort_skips_unstarted_handlers() {
        let log = Log::default();
        let aborting = {
            let log = Arc::clone(&log);
            boxed(move |ctx: &mut Context| {
                log.lock().unwrap().push("M2".to_string());
                ctx.abort(StatusCode::UNAUTHORIZED, "denied");
                ctx.next();
            })
        };
        let mut ctx = Context::new(Method::GET, "/");
        ctx.set_chain(vec![wrapping(&log, "M1"), aborting, terminal(&log, "H")]);
        ctx.next();

        assert_eq!(entries(&log), ["M1-pre", "M2", "M1-post"]);
        assert_eq!(ctx.response().status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(ctx.response().body(), br#"{"message":"denied"}"#);
        assert_eq!(ctx.cursor(), 3);
        assert!(ctx.is_finished());
    }

    #[test]
    fn test_handler_without_next_truncates_remainder() {
        let log = Log::default();
        let stopper = {
            let log = Arc::clone(&log);
            boxed(move |_: &mut Context| log.lock().unwrap().push("stop".to_string()))
        };
        let mut ctx = Context::new(Method::GET, "/");
        ctx.set_chain(vec![wrapping(&log, "M1"), stopper, terminal(&log, "H")]);
        ctx.next();

        assert_eq!(entries(&log), ["M1-pre", "stop", "M1-post"]);
        assert_eq!(ctx.cursor(), 3);
        assert!(ctx.is_finished());
    }

    #[test]
    fn test_next_on_empty_chain_moves_cursor_to_end() {
        let mut ctx = Context::new(Method::GET, "/");
        assert_eq!(ctx.cursor(), -1);
        ctx.next();
        ctx.next();
        assert_eq!(ctx.cursor(), 0);
        assert!(ctx.is_finished());
    }

    #[test]
    fn test_query_and_form_values() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/login?user=query&lang=en")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();
        let ctx = Context::from_request(parts, Bytes::from_static(b"user=form"));

        assert_eq!(ctx.path(), "/login");
        assert_eq!(ctx.query("user").as_deref(), Some("query"));
        assert_eq!(ctx.form_value("user").as_deref(), Some("form"));
        assert_eq!(ctx.form_value("lang").as_deref(), Some("en"));
        assert_eq!(ctx.form_value("nope"), None);
    }

    #[test]
    fn test_from_request_decodes_path() {
        let request = axum::http::Request::get("/files/my%20notes%3F.txt?x=%20")
            .body(())
            .unwrap();
        let (parts, ()) = request.into_parts();
        let ctx = Context::from_request(parts, Bytes::new());

        assert_eq!(ctx.path(), "/files/my notes?.txt");
        assert_eq!(ctx.query("x").as_deref(), Some(" "));
    }

    #[test]
    fn test_from_request_keeps_undecodable_path() {
        let request = axum::http::Request::get("/bytes/%FF").body(()).unwrap();
        let (parts, ()) = request.into_parts();
        let ctx = Context::from_request(parts, Bytes::new());
        assert_eq!(ctx.path(), "/bytes/%FF");
    }

    #[test]
    fn test_new_splits_query() {
        let ctx = Context::new(Method::GET, "/search?q=rust");
        assert_eq!(ctx.path(), "/search");
        assert_eq!(ctx.query("q").as_deref(), Some("rust"));
    }

    #[test]
    fn test_render_without_templates_aborts() {
        let mut ctx = Context::new(Method::GET, "/");
        ctx.render(StatusCode::OK, "index.html", &serde_json::json!({}));
        assert_eq!(ctx.response().status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_plain_sets_content_type() {
        let mut ctx = Context::new(Method::GET, "/");
        ctx.plain(StatusCode::OK, "hello");
        assert_eq!(
            ctx.response().headers().get("content-type").unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(ctx.response().body(), b"hello");
    }
}
