//! API route handlers for the model-monitor server.

pub mod health;
pub mod monitor;

use std::sync::Arc;

use axum::Router;

use model_monitor_core::{ROP, SETUP_TIME};

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Mirrored per dataset under `/api/rop-monitor` and
/// `/api/setup-time-monitor`:
/// - GET /available-months - Months present in the data, newest first
/// - GET /metric-cards?selectedMonth= - Headline numbers for one month
/// - GET /metric-trends-cards - Spark-chart summary cards
/// - GET /monthly-trends - All-months trend line
/// - GET /grouped-metrics?groupBy=&selectedMonth?&selectedGroups? - Snapshot by dimension
/// - GET /trends-grouped-metrics?groupBy=&selectedGroups? - Trend series by dimension
///
/// Plus GET /api/health.
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api/rop-monitor", monitor::router(&ROP))
        .nest("/api/setup-time-monitor", monitor::router(&SETUP_TIME))
        .with_state(state)
}
