//! Request Governor - gateway binary
//!
//! Exposes the governor over HTTP and keeps configured resources warm.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use request_governor::{create_router, spawn_sync_task, AppState, Config};

/// Main entry point for the gateway.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the governor (cache, quota record, upstream client)
/// 4. Start the background sync task if resources are configured
/// 5. Serve the router until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "request_governor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Request Governor");

    let config = Config::from_env();
    info!(
        "Configuration loaded: upstream={}, max_cache_size={}, cache_ttl={}s, max_daily_requests={}, offline_mode={}, port={}",
        config.upstream_url,
        config.policy.max_cache_size,
        config.policy.cache_ttl,
        config.policy.max_daily_requests,
        config.policy.offline_mode,
        config.server_port
    );

    let state = AppState::from_config(&config);
    info!("Quota record at {}", config.quota_file.display());

    let sync_handle = if config.sync_resources.is_empty() {
        None
    } else {
        Some(spawn_sync_task(
            state.governor.clone(),
            config.sync_resources.clone(),
            config.policy.sync_interval,
        ))
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sync_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops the sync task.
async fn shutdown_signal(sync_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = sync_handle {
        handle.abort();
        warn!("Sync task aborted");
    }
}
