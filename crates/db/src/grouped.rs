// crates/db/src/grouped.rs
//! Grouped-metrics aggregation — the query pattern shared by both monitors.
//!
//! A request names one allow-listed dimension, optionally a month, and
//! optionally an explicit set of group values. [`GroupedQuery`] is the
//! validated plan: it can only be constructed through the dataset's
//! dimension allow-list, so no caller string ever reaches query text, and
//! month/group values are always bound parameters. Executors return the
//! aggregate alongside the full group universe so the dashboard can render
//! "N of M selected" filter chips.
//!
//! The universe and the aggregation run as separate statements, not in a
//! shared transaction; under a concurrent load they may briefly disagree.

use serde::Serialize;
use ts_rs::TS;

use model_monitor_core::{DatasetSpec, Dimension, InvalidDimension, MonthKey};

use crate::{Database, DbResult};

/// Snapshot views return at most this many groups, ranked by mean
/// recommended error.
pub const SNAPSHOT_GROUP_LIMIT: u32 = 10;

/// Number of groups auto-selected for trend views when the caller picks
/// none.
pub const DEFAULT_TREND_GROUPS: u32 = 2;

// ============================================================================
// Response Types
// ============================================================================

/// Aggregates for one group value in a snapshot view.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GroupedMetricRow {
    pub group_name: String,
    /// Mean AI/ML-recommended absolute error, unrounded.
    pub aiml_metric: f64,
    /// Mean planned/baseline absolute error, unrounded.
    pub planned_metric: f64,
    /// Qualifying rows in the group.
    #[ts(type = "number")]
    pub count: i64,
    /// Distinct process orders in the group.
    #[ts(type = "number")]
    pub process_order_count: i64,
}

/// Snapshot response: ranked per-group aggregates plus the selectable
/// universe.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GroupedMetricsSnapshot {
    pub grouped_metrics: Vec<GroupedMetricRow>,
    pub all_available_groups: Vec<String>,
    pub total_groups_count: usize,
}

/// One month of one group's trend series.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GroupTrendPoint {
    /// English month name, e.g. `"January"`.
    pub month: String,
    pub year: i32,
    pub aiml_metric: f64,
    pub planned_metric: f64,
    #[ts(type = "number")]
    pub process_order_count: i64,
    #[ts(type = "number")]
    pub count: i64,
}

/// Monthly series for one group, points chronologically ascending.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GroupTrendSeries {
    pub group_name: String,
    pub trend_data: Vec<GroupTrendPoint>,
}

/// Trends response: one series per selected (or defaulted) group plus the
/// all-months universe.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct GroupedTrends {
    pub grouped_trends_metrics: Vec<GroupTrendSeries>,
    pub all_available_groups: Vec<String>,
    pub total_groups_count: usize,
}

// ============================================================================
// Validated query plan
// ============================================================================

/// A validated grouped-aggregation request.
///
/// Construction fails with [`InvalidDimension`] for any `group_by` outside
/// the dataset's allow-list — before any SQL exists to run. Snapshot
/// requests may carry a month filter; trend requests pass `None` so both
/// the series and the universe span all months.
#[derive(Debug)]
pub struct GroupedQuery {
    dataset: &'static DatasetSpec,
    dimension: &'static Dimension,
    selected_month: Option<String>,
    selected_groups: Vec<String>,
}

impl GroupedQuery {
    pub fn new(
        dataset: &'static DatasetSpec,
        group_by: &str,
        selected_month: Option<String>,
        selected_groups: Vec<String>,
    ) -> Result<Self, InvalidDimension> {
        let dimension = dataset.dimension(group_by)?;
        Ok(Self {
            dataset,
            dimension,
            selected_month,
            selected_groups,
        })
    }

    pub fn dimension(&self) -> &'static Dimension {
        self.dimension
    }

    /// Rows qualify when both error metrics and the dimension are present.
    fn base_filter(&self) -> String {
        format!(
            "{rec} IS NOT NULL AND {plan} IS NOT NULL AND {dim} IS NOT NULL",
            rec = self.dataset.recommended_metric,
            plan = self.dataset.planned_metric,
            dim = self.dimension.column,
        )
    }
}

fn placeholders(n: usize) -> String {
    let mut s = String::with_capacity(n * 2);
    for i in 0..n {
        if i > 0 {
            s.push(',');
        }
        s.push('?');
    }
    s
}

// ============================================================================
// Database Queries
// ============================================================================

impl Database {
    /// Full candidate set of group values for selector UIs, sorted
    /// ascending, plus its size via `.len()`.
    ///
    /// Honors the plan's month filter but never the group-value filter: the
    /// universe is what the user *could* select, not what they have
    /// selected. Trend plans carry no month, so their universe stays stable
    /// across the whole time range.
    pub async fn group_universe(&self, query: &GroupedQuery) -> DbResult<Vec<String>> {
        let dim = query.dimension.column;
        let mut sql = format!(
            "SELECT DISTINCT {dim} FROM {table} WHERE {filter}",
            table = query.dataset.table,
            filter = query.base_filter(),
        );
        if query.selected_month.is_some() {
            sql.push_str(" AND strftime('%Y-%m', actual_start_date, 'unixepoch') = ?");
        }
        sql.push_str(&format!(" ORDER BY {dim} ASC"));

        let mut q = sqlx::query_as::<_, (String,)>(&sql);
        if let Some(month) = &query.selected_month {
            q = q.bind(month);
        }
        let rows = q.fetch_all(self.pool()).await?;
        Ok(rows.into_iter().map(|(group,)| group).collect())
    }

    /// Default group selection for trend views: the [`DEFAULT_TREND_GROUPS`]
    /// groups with the highest mean recommended error, group name ascending
    /// on ties.
    pub async fn top_default_groups(&self, query: &GroupedQuery) -> DbResult<Vec<String>> {
        let dim = query.dimension.column;
        let sql = format!(
            "SELECT {dim} FROM {table} \
             WHERE {filter} \
             GROUP BY {dim} \
             ORDER BY AVG({rec}) DESC, {dim} ASC \
             LIMIT {limit}",
            table = query.dataset.table,
            filter = query.base_filter(),
            rec = query.dataset.recommended_metric,
            limit = DEFAULT_TREND_GROUPS,
        );

        let rows: Vec<(String,)> = sqlx::query_as(&sql).fetch_all(self.pool()).await?;
        Ok(rows.into_iter().map(|(group,)| group).collect())
    }

    /// Single-month (or all-time) snapshot: per-group aggregates ranked by
    /// mean recommended error descending (group name ascending on ties),
    /// truncated to [`SNAPSHOT_GROUP_LIMIT`].
    pub async fn grouped_metrics(&self, query: &GroupedQuery) -> DbResult<GroupedMetricsSnapshot> {
        let universe = self.group_universe(query).await?;

        let dim = query.dimension.column;
        let rec = query.dataset.recommended_metric;
        let mut sql = format!(
            "SELECT {dim}, AVG({rec}), AVG({plan}), COUNT(*), COUNT(DISTINCT process_order_number) \
             FROM {table} WHERE {filter}",
            table = query.dataset.table,
            plan = query.dataset.planned_metric,
            filter = query.base_filter(),
        );

        let mut binds: Vec<&str> = Vec::new();
        if let Some(month) = &query.selected_month {
            sql.push_str(" AND strftime('%Y-%m', actual_start_date, 'unixepoch') = ?");
            binds.push(month);
        }
        if !query.selected_groups.is_empty() {
            sql.push_str(&format!(
                " AND {dim} IN ({})",
                placeholders(query.selected_groups.len())
            ));
            binds.extend(query.selected_groups.iter().map(String::as_str));
        }
        sql.push_str(&format!(
            " GROUP BY {dim} ORDER BY AVG({rec}) DESC, {dim} ASC LIMIT {SNAPSHOT_GROUP_LIMIT}"
        ));

        let mut q = sqlx::query_as::<_, (String, f64, f64, i64, i64)>(&sql);
        for value in binds {
            q = q.bind(value);
        }
        let rows = q.fetch_all(self.pool()).await?;

        Ok(GroupedMetricsSnapshot {
            grouped_metrics: rows
                .into_iter()
                .map(
                    |(group_name, aiml, planned, count, orders)| GroupedMetricRow {
                        group_name,
                        aiml_metric: aiml,
                        planned_metric: planned,
                        count,
                        process_order_count: orders,
                    },
                )
                .collect(),
            total_groups_count: universe.len(),
            all_available_groups: universe,
        })
    }

    /// Per-group monthly series for the selected groups, or the top-K
    /// default when the plan names none.
    ///
    /// Every requested group yields a series — empty when it has no
    /// qualifying rows — in request order (ranking order for defaults).
    pub async fn grouped_trends(&self, query: &GroupedQuery) -> DbResult<GroupedTrends> {
        let universe = self.group_universe(query).await?;

        let groups = if query.selected_groups.is_empty() {
            self.top_default_groups(query).await?
        } else {
            query.selected_groups.clone()
        };

        let mut series: Vec<GroupTrendSeries> = groups
            .iter()
            .map(|group| GroupTrendSeries {
                group_name: group.clone(),
                trend_data: Vec::new(),
            })
            .collect();

        if !groups.is_empty() {
            let dim = query.dimension.column;
            let sql = format!(
                "SELECT {dim}, strftime('%Y-%m', actual_start_date, 'unixepoch') AS bucket, \
                        AVG({rec}), AVG({plan}), COUNT(DISTINCT process_order_number), COUNT(*) \
                 FROM {table} \
                 WHERE actual_start_date IS NOT NULL AND {filter} \
                   AND {dim} IN ({ph}) \
                 GROUP BY {dim}, bucket \
                 ORDER BY {dim} ASC, bucket ASC",
                table = query.dataset.table,
                rec = query.dataset.recommended_metric,
                plan = query.dataset.planned_metric,
                filter = query.base_filter(),
                ph = placeholders(groups.len()),
            );

            let mut q = sqlx::query_as::<_, (String, String, f64, f64, i64, i64)>(&sql);
            for group in &groups {
                q = q.bind(group);
            }

            for (group_name, bucket, aiml, planned, orders, count) in
                q.fetch_all(self.pool()).await?
            {
                let key = MonthKey::parse(&bucket)?;
                if let Some(entry) = series.iter_mut().find(|s| s.group_name == group_name) {
                    entry.trend_data.push(GroupTrendPoint {
                        month: key.month_name().to_string(),
                        year: key.year,
                        aiml_metric: aiml,
                        planned_metric: planned,
                        process_order_count: orders,
                        count,
                    });
                }
            }
        }

        Ok(GroupedTrends {
            grouped_trends_metrics: series,
            total_groups_count: universe.len(),
            all_available_groups: universe,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
