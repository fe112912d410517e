//! tvp-server: HTTP surface, stream relaying and EPG scheduling.
//!
//! This crate ties the proxy together into a running server. It provides:
//!
//! - Axum routes for slug registration, stream redirects, HLS manifest
//!   rewriting and segment relaying
//! - One self-healing EPG refresh scheduler per configured provider
//! - Graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod providers;
pub mod registry;
pub mod router;
pub mod routes;
pub mod scheduler;
pub mod upstream;

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tvp_core::config::Config;

use crate::context::AppContext;

/// Start the proxy.
///
/// Builds the [`AppContext`], binds the configured address and serves until a
/// shutdown signal is received.
pub async fn start(config: Config) -> tvp_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    if !config.data_dir.exists() {
        std::fs::create_dir_all(&config.data_dir)?;
        tracing::info!("Created data directory {}", config.data_dir.display());
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| tvp_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| tvp_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    let ctx = AppContext::new(config);
    serve(listener, ctx, CancellationToken::new()).await
}

/// Serve on an already-bound listener until a shutdown signal arrives or
/// `cancel` fires. Schedulers run for exactly as long as the server does.
pub async fn serve(
    listener: TcpListener,
    ctx: AppContext,
    cancel: CancellationToken,
) -> tvp_core::Result<()> {
    let supervisors = ctx.schedulers.start(&cancel);
    tracing::info!(providers = ctx.schedulers.len(), "Started EPG schedulers");

    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Listening on {addr}");
    }

    let app = router::build_router(ctx);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await;

    // Stop the schedulers whether or not the server exited cleanly.
    cancel.cancel();
    for handle in supervisors {
        if let Err(e) = handle.await {
            tracing::warn!("Supervisor task ended abnormally: {e}");
        }
    }

    result?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
}
