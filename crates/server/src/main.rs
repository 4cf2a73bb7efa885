// crates/server/src/main.rs
//! Model-monitor server binary.
//!
//! Opens the SQLite store, serves the dashboard API, and drains the pool on
//! SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use model_monitor_db::Database;
use model_monitor_server::create_app;

/// Default port for the server.
const DEFAULT_PORT: u16 = 3001;

/// Get the server port from environment or use default.
fn get_port() -> u16 {
    std::env::var("MODEL_MONITOR_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Resolve until SIGINT or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();

    let db = match std::env::var("MODEL_MONITOR_DB") {
        Ok(path) => Database::new(Path::new(&path)).await?,
        Err(_) => Database::open_default().await?,
    };

    let app = create_app(db.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], get_port()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "model-monitor listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    tracing::info!("database connection closed");

    Ok(())
}
