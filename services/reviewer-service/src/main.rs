//! Reviewer assignment service.
//!
//! Assigns pull request reviewers from the author's team and exposes the
//! team, user, pull request and statistics endpoints over HTTP.

use anyhow::Result;
use prr_server::{
    api,
    config::{Config, LogFormat, StorageBackend},
    db::Database,
    state::AppState,
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing (prefer RUST_LOG, fallback to log.level)
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log.level.clone().into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }

    info!("Starting reviewer service");
    info!(
        listen_addr = %config.http.listen_addr,
        backend = ?config.storage.backend,
        exclude_inactive = config.assignment.exclude_inactive,
        "Configuration loaded"
    );

    let policy = config.assignment.policy();
    let state = match config.storage.backend {
        StorageBackend::Postgres => {
            let db = match Database::connect(&config.database).await {
                Ok(db) => {
                    info!("Database connection established");
                    db
                }
                Err(e) => {
                    error!(error = %e, "Failed to connect to database");
                    return Err(e.into());
                }
            };

            if config.database.run_migrations {
                info!("Running database migrations");
                if let Err(e) = db.run_migrations().await {
                    error!(error = %e, "Failed to run migrations");
                    return Err(e.into());
                }
            }

            AppState::new(db, policy)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; state is lost on restart");
            AppState::in_memory(policy)
        }
    };

    // Create shutdown channel for graceful shutdown
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let app = api::create_router(state, &config.http);

    let listener = tokio::net::TcpListener::bind(&config.http.listen_addr).await?;
    info!(addr = %config.http.listen_addr, "Listening for connections");

    let mut server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                while !*shutdown_rx.borrow() {
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    // Wait for shutdown signal (Ctrl+C)
    let finished = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            None
        }
        result = &mut server_handle => Some(result),
    };

    let result = match finished {
        Some(result) => result,
        None => {
            let _ = shutdown_tx.send(true);
            // In-flight requests get the same budget as any single request.
            match tokio::time::timeout(config.http.request_timeout(), server_handle).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("HTTP server did not shut down in time");
                    return Ok(());
                }
            }
        }
    };

    match result {
        Ok(Ok(())) => info!("Server exited normally"),
        Ok(Err(e)) => error!(error = %e, "Server error"),
        Err(e) => error!(error = %e, "Server task panicked"),
    }

    info!("Reviewer service shutdown complete");
    Ok(())
}
