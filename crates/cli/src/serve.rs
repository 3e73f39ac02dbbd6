//! # CLI Server
//!
//! Builds the application state from the environment and serves it until a
//! shutdown signal arrives.

use std::{net::SocketAddr, sync::Arc};

use anyhow::anyhow;
use error::Result;
use keystone::HttpIdentityService;
use server::{
    create_app_router,
    session::redis_store,
    settings::SessionBackend,
    AppState,
    AuthSettings,
    ServerResult,
};
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;
use tracing::{info, warn};

use crate::{commands::ServeArgs, config::parse_socket_addr};

/// Starts the HTTP server
pub async fn serve(args: &ServeArgs) -> Result<()> {
    info!(target: "serve", "Starting session broker...");

    let settings = AuthSettings::from_env()?;
    info!(
        target: "serve",
        keystone_url = %settings.keystone_url,
        regions = settings.regions.len(),
        session_backend = %settings.session.backend,
        "Configuration loaded"
    );
    if settings.ssl_no_verify {
        warn!(target: "serve", "TLS certificate verification is disabled for the identity service");
    }
    if settings.trust_forwarded_proto {
        info!(target: "serve", "CAS service URLs honour X-Forwarded-Proto");
    }

    let backend = settings.session.backend;
    let redis_url = settings.session.redis_url.clone();
    let identity = Arc::new(HttpIdentityService::new(settings.client_options()));
    let state = AppState::new(settings, identity);
    let app = match backend {
        SessionBackend::Memory => create_app_router(state, MemoryStore::default()),
        SessionBackend::Redis => create_app_router(state, redis_store(&redis_url).await?),
    };

    let address = parse_socket_addr(&args.host, args.port)
        .map_err(|e| anyhow!("Invalid bind address {}:{}: {}", args.host, args.port, e))?;
    serve_http(&app, &address).await
}

/// Serves the application over HTTP
async fn serve_http(app: &axum::Router, address: &SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(address)
        .await
        .map_err(|e| anyhow!("Failed to bind to {}: {}", address, e))?;

    let result = ServerResult::new(&address.to_string());
    info!(target: "serve", address = %result.address, started_at = %result.started_at, "Starting HTTP server...");

    axum::serve(listener, app.clone())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow!("HTTP server error: {}", e))?;

    info!(target: "serve", "HTTP server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(target: "serve", error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                warn!(target: "serve", error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!(target: "serve", "Received shutdown signal");
}
