//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use switchyard::{Engine, HttpServer, ServerConfig, Shutdown};

/// Config suitable for tests: loopback, ephemeral port.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config
}

/// Send one request through the full transport stack, in process.
pub async fn oneshot(
    engine: Engine,
    config: ServerConfig,
    request: Request<Body>,
) -> (StatusCode, axum::http::HeaderMap, String) {
    let router = HttpServer::new(engine, config).into_router();
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8_lossy(&bytes).into_owned())
}

/// Shorthand for a bodiless GET through [`oneshot`].
pub async fn get(engine: Engine, uri: &str) -> (StatusCode, axum::http::HeaderMap, String) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    oneshot(engine, test_config(), request).await
}

/// Serve `engine` on a real socket. Returns the bound address and the
/// shutdown handle plus the server task.
pub async fn spawn_server(
    engine: Engine,
) -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
    spawn_server_with(engine, test_config()).await
}

/// [`spawn_server`] with an explicit configuration.
pub async fn spawn_server_with(
    engine: Engine,
    config: ServerConfig,
) -> (SocketAddr, Shutdown, tokio::task::JoinHandle<()>) {
    let server = HttpServer::new(engine, config);
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let task = tokio::spawn(async move {
        server.run(listener, receiver).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown, task)
}
