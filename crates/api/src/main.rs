use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use printbroker_core::registry::InMemoryRegistry;
use printbroker_core::spooler::CupsSpooler;
use printbroker_core::uploads::UploadStore;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use printbroker_api::config::ServerConfig;
use printbroker_api::router::build_app_router;
use printbroker_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "printbroker_api=debug,printbroker_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::load();
    tracing::info!(
        host = %config.host,
        port = config.port,
        printer = %config.printer_name,
        max_upload_bytes = config.max_upload_bytes(),
        origins = ?config.cors_origins,
        "Loaded server configuration"
    );

    // --- Storage ---
    let uploads = UploadStore::new(&config.upload_dir, config.max_upload_bytes());
    uploads
        .ensure_dir()
        .await
        .context("Failed to prepare upload directory")?;
    tokio::fs::create_dir_all(&config.tmp_dir)
        .await
        .with_context(|| format!("Failed to create temp dir {}", config.tmp_dir.display()))?;
    tracing::info!(
        upload_dir = %config.upload_dir.display(),
        tmp_dir = %config.tmp_dir.display(),
        "Storage directories ready"
    );

    // --- Spooler ---
    // Cancelled on shutdown so in-flight spooler waits do not hold the drain.
    let shutdown = CancellationToken::new();
    let spooler = CupsSpooler::new(
        config.submit_command.clone(),
        config.status_command.clone(),
        Duration::from_secs(config.spooler_timeout_secs),
        shutdown.clone(),
    );

    // --- App state ---
    let addr = SocketAddr::new(
        config
            .host
            .parse::<IpAddr>()
            .with_context(|| format!("Invalid HOST address '{}'", config.host))?,
        config.port,
    );

    let state = AppState {
        config: Arc::new(config),
        registry: Arc::new(InMemoryRegistry::new()),
        spooler: Arc::new(spooler),
        uploads: Arc::new(uploads),
    };

    // --- Router ---
    let app = build_app_router(state);

    // --- Start server ---
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for a termination signal to initiate graceful shutdown, then cancel
/// outstanding spooler invocations.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal(spooler_cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }

    spooler_cancel.cancel();
}
