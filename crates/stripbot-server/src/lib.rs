//! stripbot-server: HTTP API, comic fetcher, Bluesky client, and scheduler.
//!
//! This crate ties the other stripbot crates into a running application:
//!
//! - Axum-based HTTP API over comics, posts, and admin triggers
//! - Background scheduler that keeps the buffer full and posts on interval
//! - Record-store and image-storage backends selected from config
//! - Graceful shutdown via signal handling

pub mod bluesky;
pub mod context;
pub mod error;
pub mod fetch;
pub mod format;
pub mod router;
pub mod routes;
pub mod scheduler;
pub mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use stripbot_core::config::{Config, RecordsBackend, StorageBackend};
use stripbot_db::{RecordStore, SledStore, SqliteStore};

use crate::bluesky::BlueskyClient;
use crate::context::AppContext;
use crate::fetch::StripFetcher;
use crate::storage::{ImageStore, LocalImageStore, S3ImageStore};

/// Construct the application context from configuration.
///
/// Opens the configured record store (creating parent directories as needed)
/// and wires up the storage backend, fetcher, and Bluesky client. Used by
/// the server, the CLI one-shots, and the serverless entry points.
pub fn build_context(config: Config) -> stripbot_core::Result<AppContext> {
    let records: Arc<dyn RecordStore> = match config.records.backend {
        RecordsBackend::Sqlite => {
            let db_path = &config.server.db_path;
            let existed = db_path.exists();
            if let Some(parent) = db_path.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                    tracing::info!("Created database directory {}", parent.display());
                }
            }
            let db_str = db_path.to_string_lossy();
            let store = SqliteStore::open(&db_str)?;
            if existed {
                tracing::info!("Database opened (existing) at {db_str}");
            } else {
                tracing::info!("Database created (new) at {db_str}");
            }
            Arc::new(store)
        }
        RecordsBackend::Sled => {
            tracing::info!("Opening sled store at {}", config.records.sled_path.display());
            Arc::new(SledStore::open(&config.records.sled_path)?)
        }
    };

    let images: Arc<dyn ImageStore> = match config.storage.backend {
        StorageBackend::Local => Arc::new(LocalImageStore::new(config.storage.image_dir.clone())),
        StorageBackend::S3 => Arc::new(S3ImageStore::new(&config.storage)?),
    };

    let fetcher = Arc::new(StripFetcher::new(&config.comic));
    let bluesky = Arc::new(BlueskyClient::new(&config.bluesky));

    Ok(AppContext {
        records,
        images,
        bluesky,
        fetcher,
        config: Arc::new(config),
    })
}

/// Start the stripbot server.
///
/// Initializes the context, spawns the scheduler (when enabled), and serves
/// the HTTP API. Returns when a shutdown signal is received.
pub async fn start(config: Config) -> stripbot_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let ctx = build_context(config)?;

    let cancel = CancellationToken::new();

    let scheduler_handle = if ctx.config.scheduler.enabled {
        let scheduler_ctx = ctx.clone();
        let scheduler_cancel = cancel.clone();
        Some(tokio::spawn(async move {
            scheduler::run_scheduler(scheduler_ctx, scheduler_cancel).await;
        }))
    } else {
        tracing::info!("Scheduler disabled by config");
        None
    };

    let addr: SocketAddr = format!("{}:{}", ctx.config.server.host, ctx.config.server.port)
        .parse()
        .map_err(|e| stripbot_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let app = router::build_router(ctx);

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| stripbot_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    let shutdown_cancel = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_cancel))
        .await
        .map_err(|e| stripbot_core::Error::Internal(format!("Server error: {e}")))?;

    cancel.cancel();
    if let Some(handle) = scheduler_handle {
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
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
