//! Static file handler mounted at `<prefix>/*filepath`.

use std::fs;
use std::path::{Component, Path, PathBuf};

use axum::http::StatusCode;

use crate::dispatch::{Context, Handler};

/// Serves files below a base directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    /// Map a request-relative path under the base directory.
    ///
    /// Only normal components are accepted, which rules out `..` and
    /// absolute paths.
    fn map_path(&self, relative: &str) -> Option<PathBuf> {
        let mut path = self.base_dir.clone();
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => path.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(path)
    }

    fn content_type(path: &Path) -> &'static str {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "html" | "htm" => "text/html; charset=utf-8",
            "css" => "text/css",
            "js" => "application/javascript",
            "json" => "application/json",
            "txt" => "text/plain; charset=utf-8",
            "svg" => "image/svg+xml",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "ico" => "image/x-icon",
            "wasm" => "application/wasm",
            _ => "application/octet-stream",
        }
    }
}

impl Handler for StaticFiles {
    fn call(&self, ctx: &mut Context) {
        let file = ctx.param("filepath").unwrap_or_default();
        let Some(path) = self.map_path(file).filter(|p| p.is_file()) else {
            tracing::debug!(file = %file, "Static file not found");
            ctx.status(StatusCode::NOT_FOUND);
            return;
        };

        match fs::read(&path) {
            Ok(bytes) => ctx.data(StatusCode::OK, Self::content_type(&path), &bytes),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Static file unreadable");
                ctx.status(StatusCode::NOT_FOUND);
            }
        }
    }
}
