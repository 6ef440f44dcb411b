//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum router that feeds every request to the engine
//! - Wire up transport middleware (timeout, concurrency, request ID, trace)
//! - Buffer request bodies within the configured limit
//! - Run the synchronous handler chain off the async workers
//! - Contain handler panics that no recovery middleware caught
//! - Serve with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::dispatch::{Context, Engine};
use crate::http::request::MakeRequestUuidV4;
use crate::lifecycle::signals::shutdown_signal;

/// Error type for serving.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    /// The server loop failed.
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

/// State injected into the catch-all handler.
#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
    max_body_size: usize,
}

/// HTTP server driving an [`Engine`].
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Freeze `engine` and wrap it in the transport stack.
    pub fn new(engine: Engine, config: ServerConfig) -> Self {
        engine.log_routes();
        let state = AppState {
            engine: Arc::new(engine),
            max_body_size: config.limits.max_body_size,
        };
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the axum router with all middleware layers.
    ///
    /// The concurrency limit is global: one semaphore for both routes.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(dispatch_request))
            .route("/{*path}", any(dispatch_request))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServeError> {
        let address = self.config.listener.bind_address.clone();
        TcpListener::bind(&address)
            .await
            .map_err(|source| ServeError::Bind { address, source })
    }

    /// Serve on `listener` until `shutdown` fires or the process is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServeError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let stop = async move {
            tokio::select! {
                _ = shutdown.recv() => tracing::info!("Shutdown requested"),
                _ = shutdown_signal() => {}
            }
        };

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(stop)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The axum router, for embedding or in-process tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Catch-all handler: buffer the body, run the engine, return its response.
async fn dispatch_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Request body rejected");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let mut ctx = Context::from_request(parts, body);
    let method = ctx.method().clone();
    let path = ctx.path().to_string();
    let engine = Arc::clone(&state.engine);

    let outcome = tokio::task::spawn_blocking(move || {
        engine.handle(&mut ctx);
        ctx
    })
    .await;

    match outcome {
        Ok(ctx) => ctx.into_response(),
        Err(e) => {
            tracing::error!(
                method = %method,
                path = %path,
                error = %e,
                "Handler fault escaped the chain"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
