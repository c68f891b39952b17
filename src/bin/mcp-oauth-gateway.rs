// ABOUTME: Server binary: load configuration, open the persistent store, serve the OAuth
// ABOUTME: HTTP surface, and run a background sweep of expired records.
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mcp_oauth_gateway::{config::ServerConfig, constants::defaults, http, logging::LoggingConfig, store::Store, AppContext};
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env()?;
    LoggingConfig::from_env().init()?;
    info!(
        issuer_url = %config.issuer_url,
        provider = ?config.oauth2.provider,
        "starting mcp-oauth-gateway"
    );

    let default_scope = config
        .oauth2
        .default_scopes
        .first()
        .cloned()
        .unwrap_or_else(|| "read".to_owned());
    let store = Arc::new(Store::load(&config.data_dir, &default_scope).await?);
    spawn_sweep_task(store.clone());

    let config = Arc::new(config);
    let ctx = Arc::new(AppContext::new(config.clone(), store));
    let router = http::build_router(ctx);

    let addr = format!("0.0.0.0:{}", config.http_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Periodically remove expired pending authorizations, codes, and tokens
/// (SPEC_FULL.md §5: sweep interval must be at least `SWEEP_INTERVAL_SECS`).
fn spawn_sweep_task(store: Arc<Store>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(defaults::SWEEP_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            if let Err(e) = store.sweep().await {
                error!(error = %e, "periodic sweep failed");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        sig.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}
