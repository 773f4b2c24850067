use super::handlers::{handle_generate, handle_health, handle_status, handle_verify};
use super::{AppState, MAX_BODY_SIZE, REQUEST_TIMEOUT_SECS};

use crate::config::Config;
use crate::llm;
use crate::pipeline::RelayService;
use anyhow::{Context, Result};
use axum::{
    Router,
    http::{Method, StatusCode, header},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Returns true when the bind address is not a loopback address.
pub fn is_public_bind(host: &str) -> bool {
    !matches!(
        host,
        "127.0.0.1" | "localhost" | "::1" | "[::1]" | "0:0:0:0:0:0:0:1"
    )
}

/// Run the HTTP gateway using axum with proper HTTP/1.1 compliance.
pub async fn run_gateway(host: &str, port: u16, config: Arc<Config>) -> Result<()> {
    // ── Security: refuse public bind without explicit opt-in ──
    if is_public_bind(host) && !config.gateway.allow_public_bind {
        anyhow::bail!(
            "Refusing to bind to {host}: the relay would be exposed to the internet.\n\
             Fix: use --host 127.0.0.1 (default), or set\n\
             [gateway] allow_public_bind = true in config.toml."
        );
    }

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("parse gateway bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind gateway socket")?;

    run_gateway_with_listener(host, listener, config).await
}

/// Run the HTTP gateway from a pre-bound listener until Ctrl-C.
pub async fn run_gateway_with_listener(
    host: &str,
    listener: tokio::net::TcpListener,
    config: Arc<Config>,
) -> Result<()> {
    run_gateway_until(host, listener, config, shutdown_signal()).await
}

/// Run the HTTP gateway until `shutdown` resolves, then drain in-flight
/// requests.
pub async fn run_gateway_until(
    host: &str,
    listener: tokio::net::TcpListener,
    config: Arc<Config>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let actual_port = listener
        .local_addr()
        .context("get gateway listener local address")?
        .port();
    let display_addr = format!("{host}:{actual_port}");

    let provider = llm::create_provider(&config.provider);
    if let Err(e) = provider.warmup().await {
        tracing::warn!(provider = provider.name(), error = %e, "provider warmup failed");
    }

    let relay = RelayService::from_config(&config, provider)
        .context("build relay service from config")?;
    print_gateway_banner(&display_addr, &config, &relay);

    let state = AppState {
        relay: Arc::new(relay),
    };
    let app = build_app(state, &config.gateway.cors_origins);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("serve HTTP gateway")?;

    tracing::info!("relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl-C; serving until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

fn print_gateway_banner(display_addr: &str, config: &Config, relay: &RelayService) {
    tracing::info!(
        service = %config.identity.service_name,
        version = %config.identity.version,
        provider = %config.provider.name,
        model = %config.provider.model,
        api_key_configured = config.provider.has_api_key(),
        ledger = %relay.gate().ledger().location(),
        "relay starting"
    );
    if !config.provider.has_api_key() {
        tracing::warn!("no provider API key configured; every generation will use the local fallback");
    }

    println!("Relay listening on {display_addr}");
    println!("  GET  /health");
    println!("  GET  /api/status");
    println!("  POST /api/verify");
    println!("  POST /api/generate");
    println!(
        "  Gate: {} attempts, {} min lockout",
        config.gate.max_attempts, config.gate.lockout_minutes
    );
}

pub(super) fn cors_layer(cors_origins: &[String]) -> Option<CorsLayer> {
    if cors_origins.is_empty() {
        return None;
    }
    // A literal "*" mixed into an origin list would make tower-http panic.
    let allow_origin = if cors_origins.iter().any(|o| o.trim() == "*") {
        AllowOrigin::from(Any)
    } else {
        let origins: Vec<_> = cors_origins.iter().filter_map(|o| o.parse().ok()).collect();
        AllowOrigin::list(origins)
    };
    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

pub fn build_app(state: AppState, cors_origins: &[String]) -> Router {
    let mut app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/status", get(handle_status))
        .route("/api/verify", post(handle_verify))
        .route("/api/generate", post(handle_generate))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ));

    if let Some(cors) = cors_layer(cors_origins) {
        app = app.layer(cors);
    }

    app
}
