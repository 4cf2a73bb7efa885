// crates/server/src/routes/monitor.rs
//! Monitor endpoints, mirrored for the ROP and Setup-Time datasets.
//!
//! Both datasets share every handler; the router is instantiated once per
//! dataset descriptor and nested under its own path prefix. Validation
//! happens before any store access: required parameters first, then the
//! `groupBy` allow-list via [`GroupedQuery`] construction.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use model_monitor_core::DatasetSpec;
use model_monitor_db::{
    GroupedMetricsSnapshot, GroupedQuery, GroupedTrends, MetricCards, MetricTrendCards,
    MonthOption, MonthlyTrendPoint,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query parameters for `metric-cards`.
#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct MetricCardsParams {
    pub selected_month: Option<String>,
}

/// Query parameters for `grouped-metrics` and `trends-grouped-metrics`.
#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct GroupedParams {
    pub group_by: Option<String>,
    pub selected_month: Option<String>,
    /// Comma-separated group values.
    pub selected_groups: Option<String>,
}

/// Split a comma-separated selection.
///
/// Absent, empty, or all-blank input means "unrestricted" — the same as not
/// sending the parameter at all.
fn parse_selected_groups(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|group| !group.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// GET `/available-months` - Months present in the data, newest first.
async fn available_months(
    dataset: &'static DatasetSpec,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<MonthOption>>> {
    Ok(Json(state.db.available_months(dataset).await?))
}

/// GET `/metric-cards?selectedMonth=` - Headline numbers for one month.
async fn metric_cards(
    dataset: &'static DatasetSpec,
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetricCardsParams>,
) -> ApiResult<Json<MetricCards>> {
    let month = params
        .selected_month
        .ok_or(ApiError::MissingParameter("selectedMonth"))?;
    Ok(Json(state.db.metric_cards(dataset, &month).await?))
}

/// GET `/metric-trends-cards` - Spark-chart summary cards.
async fn metric_trends_cards(
    dataset: &'static DatasetSpec,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<MetricTrendCards>> {
    Ok(Json(state.db.metric_trend_cards(dataset).await?))
}

/// GET `/monthly-trends` - All-months trend line.
async fn monthly_trends(
    dataset: &'static DatasetSpec,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<MonthlyTrendPoint>>> {
    Ok(Json(state.db.monthly_trends(dataset).await?))
}

/// GET `/grouped-metrics?groupBy=&selectedMonth?&selectedGroups?` -
/// Snapshot by dimension.
async fn grouped_metrics(
    dataset: &'static DatasetSpec,
    State(state): State<Arc<AppState>>,
    Query(params): Query<GroupedParams>,
) -> ApiResult<Json<GroupedMetricsSnapshot>> {
    let group_by = params
        .group_by
        .ok_or(ApiError::MissingParameter("groupBy"))?;
    let groups = parse_selected_groups(params.selected_groups.as_deref());
    let query = GroupedQuery::new(dataset, &group_by, params.selected_month, groups)?;
    Ok(Json(state.db.grouped_metrics(&query).await?))
}

/// GET `/trends-grouped-metrics?groupBy=&selectedGroups?` - Trend series by
/// dimension; defaults to the two worst groups when none are selected.
async fn trends_grouped_metrics(
    dataset: &'static DatasetSpec,
    State(state): State<Arc<AppState>>,
    Query(params): Query<GroupedParams>,
) -> ApiResult<Json<GroupedTrends>> {
    let group_by = params
        .group_by
        .ok_or(ApiError::MissingParameter("groupBy"))?;
    let groups = parse_selected_groups(params.selected_groups.as_deref());
    let query = GroupedQuery::new(dataset, &group_by, None, groups)?;
    Ok(Json(state.db.grouped_trends(&query).await?))
}

/// Build the endpoint set for one dataset.
pub fn router(dataset: &'static DatasetSpec) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/available-months",
            get(move |state| available_months(dataset, state)),
        )
        .route(
            "/metric-cards",
            get(move |state, query| metric_cards(dataset, state, query)),
        )
        .route(
            "/metric-trends-cards",
            get(move |state| metric_trends_cards(dataset, state)),
        )
        .route(
            "/monthly-trends",
            get(move |state| monthly_trends(dataset, state)),
        )
        .route(
            "/grouped-metrics",
            get(move |state, query| grouped_metrics(dataset, state, query)),
        )
        .route(
            "/trends-grouped-metrics",
            get(move |state, query| trends_grouped_metrics(dataset, state, query)),
        )
}
