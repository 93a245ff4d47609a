//! # Kasir POS API Server
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Load configuration (defaults → kasir.toml → KASIR_* env)           │
//! │  2. Initialize tracing, then log how the configuration was resolved    │
//! │  3. Open the SQLite pool, apply embedded migrations                     │
//! │  4. Bind the listener and serve until Ctrl+C / SIGTERM                  │
//! │  5. Drain in-flight requests, close the pool                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```bash
//! kasir-api                     # ./kasir.toml if present
//! kasir-api --config prod.toml
//! ```

use std::path::PathBuf;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use kasir_api::{build_router, init_tracing, AppConfig, AppState};
use kasir_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = parse_args();
    let (config, report) = AppConfig::load(config_path).context("Failed to load configuration")?;

    init_tracing(&config.log);
    info!("Starting Kasir POS API server...");
    report.log();

    let addr = config.socket_addr()?;
    info!(
        addr = %addr,
        db_path = ?config.database.path,
        checkout_timeout_secs = config.checkout.timeout_secs,
        "Configuration loaded"
    );

    let db = Database::new(config.to_db_config())
        .await
        .context("Failed to open database")?;
    info!("Database connected and migrations applied");

    let app = build_router(AppState::new(db.clone()));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!(addr = %listener.local_addr()?, "Kasir POS API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server stopped");
    Ok(())
}

/// Reads `--config <path>` / `-c <path>`; anything else falls back to the
/// default lookup.
fn parse_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" || arg == "-c" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
