//! # Tally Server Binary
//!
//! ```text
//! config ──► tracing ──► SQLite (+ migrations) ──► axum on host:port
//!                                                      │
//!                                    Ctrl+C / SIGTERM ─┘ graceful shutdown
//! ```

use anyhow::Context;
use tally_db::{Database, DbConfig};
use tally_server::config::AppConfig;
use tally_server::state::AppState;
use tally_server::{build_router, init_tracing};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Tally server...");

    let config = AppConfig::load().context("Failed to load configuration")?;
    if config.uses_dev_secret() {
        warn!("Using the built-in development JWT secret; set TALLY__AUTH__JWT_SECRET in production");
    }

    let db = Database::new(
        DbConfig::new(config.database_path()).max_connections(config.database.max_connections),
    )
    .await
    .context("Failed to open database")?;
    info!(path = %config.database.path, "Database ready");

    let addr = config.bind_address();
    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
