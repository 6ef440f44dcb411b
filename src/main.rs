//! switchyard demo server
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ axum catch-all ──▶ tower layers ──▶ Engine
//!                     (http::server)     (timeout, limit,   │
//!                                         request id, trace) ▼
//!                                               group middleware (prefix scan)
//!                                                           │
//!                                                           ▼
//!                                               routing trie ──▶ route handler
//!                                                                    │
//!     Client Response                                                │
//!     ◀───────────── ResponseWriter ◀────────────────────────────────┘
//! ```

use std::path::PathBuf;

use axum::http::StatusCode;
use clap::Parser;
use serde::Serialize;

use switchyard::config::{load_config, ServerConfig};
use switchyard::observability::{logging::init_logging, metrics::init_metrics};
use switchyard::{Context, Engine, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "Demo server for the switchyard request dispatcher")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Serialize)]
struct Greeting {
    name: String,
    path: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability)?;
    tracing::info!("switchyard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        init_metrics(addr)?;
    }

    let engine = build_engine(&config);
    let server = HttpServer::new(engine, config);
    let listener = server.bind().await?;

    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_engine(config: &ServerConfig) -> Engine {
    let mut engine = Engine::with_defaults();

    if let Some(dir) = &config.templates.dir {
        engine.load_templates(dir);
    }
    for mount in &config.static_files {
        engine.static_files(&mount.prefix, &mount.root);
    }

    engine
        .get("/", |ctx: &mut Context| {
            ctx.html(StatusCode::OK, "<h1>switchyard</h1>\n");
        })
        .get("/hello/:name", |ctx: &mut Context| {
            let body = format!(
                "hello {}, you're at {}\n",
                ctx.param("name").unwrap_or_default(),
                ctx.path()
            );
            ctx.plain(StatusCode::OK, body);
        })
        .get("/panic", |ctx: &mut Context| {
            let segments: Vec<&str> = ctx.path().split('/').collect();
            // Out of bounds on purpose: exercises the recovery middleware.
            let name = segments[100].to_string();
            ctx.plain(StatusCode::OK, name);
        });

    {
        let mut v1 = engine.group("/v1");
        v1.use_middleware(|ctx: &mut Context| {
            ctx.set_header("x-api-version", "v1");
            ctx.next();
        });
        v1.get("/greet/:name", |ctx: &mut Context| {
            let greeting = Greeting {
                name: ctx.param("name").unwrap_or_default().to_string(),
                path: ctx.path().to_string(),
            };
            ctx.json(StatusCode::OK, &greeting);
        })
        .post("/login", |ctx: &mut Context| {
            let username = ctx.form_value("username").unwrap_or_default();
            let password = ctx.form_value("password").unwrap_or_default();
            if password.is_empty() {
                ctx.abort(StatusCode::UNAUTHORIZED, "password required");
                return;
            }
            ctx.json(StatusCode::OK, &serde_json::json!({ "username": username }));
        })
        .get("/assets/*filepath", |ctx: &mut Context| {
            let filepath = ctx.param("filepath").unwrap_or_default().to_string();
            ctx.json(StatusCode::OK, &serde_json::json!({ "filepath": filepath }));
        });
    }

    engine
}
