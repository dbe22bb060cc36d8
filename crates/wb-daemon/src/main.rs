//! wb-daemon entry point.
//!
//! Sets up tracing, loads config and secrets, builds the shared state, wires
//! middleware, and starts the HTTP server. Route handlers live in
//! `routes.rs`; shared state types live in `state.rs`.
//!
//! Config layers come from `WB_CONFIG` (comma-separated YAML paths, later
//! wins). With it unset every setting takes its default.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};
use wb_config::{load_layered_yaml, report_unused_keys, resolve_secrets, UnusedKeyPolicy};
use wb_daemon::{routes, state};
use wb_db::{DataSource, PgDataSource};
use wb_strategy::{builtin_registry, ReferenceClock};
use wb_submit::{AuctionSubmitter, DryRunSink, OrderSink};

const ENV_CONFIG: &str = "WB_CONFIG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Silent if the file does not exist; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let paths = config_paths_from_env();
    let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    let loaded = load_layered_yaml(&path_refs).context("load config")?;
    report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    let settings = loaded.settings()?;
    info!(config_hash = %loaded.config_hash, layers = paths.len(), "config loaded");

    let dry_run = settings.auction.dry_run;
    let secrets = resolve_secrets(&settings, !dry_run)?;

    let db_url = secrets.database_url.as_deref().with_context(|| {
        format!(
            "SECRETS_MISSING: required env var '{}' (database url) is not set or empty",
            settings.database.url_env
        )
    })?;
    let source: Arc<dyn DataSource> = Arc::new(PgDataSource::connect_lazy(
        db_url,
        settings.database.max_connections,
    )?);

    let sink: Arc<dyn OrderSink> = match secrets.auction_key.as_deref() {
        Some(key) if !dry_run => {
            let submitter = AuctionSubmitter::new(
                settings.auction.endpoint(),
                key,
                Duration::from_secs(settings.auction.request_timeout_secs),
            )
            .context("build auction client")?;
            info!(endpoint = submitter.endpoint(), "auction submission enabled");
            Arc::new(submitter)
        }
        _ => {
            info!("auction.dry_run set; orders will not leave this process");
            Arc::new(DryRunSink::new())
        }
    };

    let registry = builtin_registry().context("register built-in bidders")?;
    info!(
        bidders = ?registry.list(),
        default = registry.default_name().unwrap_or("none"),
        "bidders registered"
    );

    let clock = ReferenceClock::in_zone(&settings.bidding.timezone)?;
    let shared = Arc::new(state::AppState::new(
        registry,
        source,
        sink,
        clock,
        Duration::from_secs(settings.bidding.invocation_timeout_secs),
    ));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    let addr: SocketAddr = settings
        .daemon_addr()
        .parse()
        .context("CONFIG_INVALID: daemon.addr is not a socket address")?;
    info!("wb-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

fn config_paths_from_env() -> Vec<String> {
    std::env::var(ENV_CONFIG)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(tower_http::cors::Any)
}
