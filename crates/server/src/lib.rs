// crates/server/src/lib.rs
//! Model-monitor server library.
//!
//! Axum-based HTTP server for the manufacturing analytics dashboard. It
//! serves month pickers, metric cards, and grouped prediction-error
//! comparisons for the ROP and Setup-Time monitors out of the SQLite store
//! managed by `model-monitor-db`.

pub mod error;
pub mod routes;
pub mod state;

pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use axum::Router;
use model_monitor_db::Database;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (health plus the two mirrored monitor endpoint sets)
/// - CORS for the dashboard dev server (allows any origin)
/// - Request tracing
pub fn create_app(db: Database) -> Router {
    let state = AppState::new(db);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
