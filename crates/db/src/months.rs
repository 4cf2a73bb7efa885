// crates/db/src/months.rs
//! Month-bucketed aggregations: the picker month list, single-month metric
//! cards, the all-months trend line, and the spark-chart summary cards.
//!
//! Each query is generic over a [`DatasetSpec`]; only static identifiers
//! from the descriptor reach query text, every value is a bound parameter.

use serde::Serialize;
use ts_rs::TS;

use model_monitor_core::{DatasetSpec, MonthKey};

use crate::{Database, DbResult};

// ============================================================================
// Response Types
// ============================================================================

/// One entry in the dashboard month picker.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct MonthOption {
    /// `yyyy-MM` key, e.g. `"2024-01"`.
    pub value: String,
    /// Display label, e.g. `"January 2024"`.
    pub label: String,
    pub month: u32,
    pub year: i32,
}

/// Headline numbers for a single selected month.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct MetricCards {
    /// Distinct process orders with both error metrics present.
    #[ts(type = "number")]
    pub count: i64,
    /// Mean AI/ML-recommended absolute error, unrounded.
    pub aiml_metric: f64,
    /// Mean planned/baseline absolute error, unrounded.
    pub planned_metric: f64,
}

/// One point of the all-months trend line.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrendPoint {
    /// English month name, e.g. `"January"`.
    pub month: String,
    pub year: i32,
    /// Distinct process orders in the month.
    #[ts(type = "number")]
    pub count: i64,
    pub aiml_metric: f64,
    pub planned_metric: f64,
}

/// Count-valued spark card: monthly values plus a running total.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SparkCountCard {
    #[ts(type = "number[]")]
    pub data: Vec<i64>,
    /// Month labels, e.g. `"January 2024"`, chronologically ascending.
    pub categories: Vec<String>,
    #[ts(type = "number")]
    pub total: i64,
}

/// Mean-valued spark card: monthly means pre-rounded to 2 decimals, and the
/// arithmetic mean of those rounded values as the headline average.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SparkMeanCard {
    pub data: Vec<f64>,
    pub categories: Vec<String>,
    pub average: f64,
}

/// Spark-chart summary for the dashboard header cards.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../../dashboard/src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct MetricTrendCards {
    pub order_count: SparkCountCard,
    pub aiml_metric: SparkMeanCard,
    pub planned_metric: SparkMeanCard,
}

// ============================================================================
// Database Queries
// ============================================================================

impl Database {
    /// Distinct months with any dated record, newest first.
    pub async fn available_months(&self, dataset: &DatasetSpec) -> DbResult<Vec<MonthOption>> {
        let sql = format!(
            "SELECT DISTINCT strftime('%Y-%m', actual_start_date, 'unixepoch') AS value \
             FROM {table} \
             WHERE actual_start_date IS NOT NULL \
             ORDER BY value DESC",
            table = dataset.table,
        );

        let rows: Vec<(String,)> = sqlx::query_as(&sql).fetch_all(self.pool()).await?;

        rows.into_iter()
            .map(|(value,)| {
                let key = MonthKey::parse(&value)?;
                Ok(MonthOption {
                    label: key.label(),
                    month: key.month,
                    year: key.year,
                    value,
                })
            })
            .collect()
    }

    /// Headline card numbers for one month.
    ///
    /// Zeros when the month has no qualifying rows — the dashboard renders
    /// empty cards rather than an error.
    pub async fn metric_cards(
        &self,
        dataset: &DatasetSpec,
        selected_month: &str,
    ) -> DbResult<MetricCards> {
        let sql = format!(
            "SELECT COUNT(DISTINCT process_order_number), AVG({rec}), AVG({plan}) \
             FROM {table} \
             WHERE strftime('%Y-%m', actual_start_date, 'unixepoch') = ?1 \
               AND {rec} IS NOT NULL AND {plan} IS NOT NULL",
            table = dataset.table,
            rec = dataset.recommended_metric,
            plan = dataset.planned_metric,
        );

        let (count, aiml, planned): (i64, Option<f64>, Option<f64>) = sqlx::query_as(&sql)
            .bind(selected_month)
            .fetch_one(self.pool())
            .await?;

        Ok(MetricCards {
            count,
            aiml_metric: aiml.unwrap_or(0.0),
            planned_metric: planned.unwrap_or(0.0),
        })
    }

    /// All-months trend line, chronologically ascending, unrounded means.
    pub async fn monthly_trends(
        &self,
        dataset: &DatasetSpec,
    ) -> DbResult<Vec<MonthlyTrendPoint>> {
        let rows = self.monthly_rows(dataset).await?;
        Ok(rows
            .into_iter()
            .map(|row| MonthlyTrendPoint {
                month: row.key.month_name().to_string(),
                year: row.key.year,
                count: row.order_count,
                aiml_metric: row.aiml_mean,
                planned_metric: row.planned_mean,
            })
            .collect())
    }

    /// Spark-chart summary cards.
    ///
    /// Monthly mean values are pre-rounded to 2 decimals for the spark
    /// charts; the card average is the arithmetic mean of those rounded
    /// monthly means, itself rounded to 2 decimals. The count card carries
    /// a running total instead of an average.
    pub async fn metric_trend_cards(&self, dataset: &DatasetSpec) -> DbResult<MetricTrendCards> {
        let rows = self.monthly_rows(dataset).await?;

        let categories: Vec<String> = rows.iter().map(|row| row.key.label()).collect();
        let counts: Vec<i64> = rows.iter().map(|row| row.order_count).collect();
        let aiml: Vec<f64> = rows.iter().map(|row| round2(row.aiml_mean)).collect();
        let planned: Vec<f64> = rows.iter().map(|row| round2(row.planned_mean)).collect();

        Ok(MetricTrendCards {
            order_count: SparkCountCard {
                total: counts.iter().sum(),
                data: counts,
                categories: categories.clone(),
            },
            aiml_metric: SparkMeanCard {
                average: round2(mean(&aiml)),
                data: aiml,
                categories: categories.clone(),
            },
            planned_metric: SparkMeanCard {
                average: round2(mean(&planned)),
                data: planned,
                categories,
            },
        })
    }

    /// Shared per-month aggregation behind the trend line and the cards.
    async fn monthly_rows(&self, dataset: &DatasetSpec) -> DbResult<Vec<MonthlyRow>> {
        let sql = format!(
            "SELECT strftime('%Y-%m', actual_start_date, 'unixepoch') AS bucket, \
                    COUNT(DISTINCT process_order_number), AVG({rec}), AVG({plan}) \
             FROM {table} \
             WHERE actual_start_date IS NOT NULL \
               AND {rec} IS NOT NULL AND {plan} IS NOT NULL \
             GROUP BY bucket \
             ORDER BY bucket ASC",
            table = dataset.table,
            rec = dataset.recommended_metric,
            plan = dataset.planned_metric,
        );

        let rows: Vec<(String, i64, f64, f64)> =
            sqlx::query_as(&sql).fetch_all(self.pool()).await?;

        rows.into_iter()
            .map(|(bucket, order_count, aiml_mean, planned_mean)| {
                Ok(MonthlyRow {
                    key: MonthKey::parse(&bucket)?,
                    order_count,
                    aiml_mean,
                    planned_mean,
                })
            })
            .collect()
    }
}

struct MonthlyRow {
    key: MonthKey,
    order_count: i64,
    aiml_mean: f64,
    planned_mean: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use model_monitor_core::{ROP, SETUP_TIME};

    async fn test_db() -> Database {
        Database::new_in_memory().await.expect("in-memory DB")
    }

    /// Unix seconds for noon UTC on the given date.
    fn ts(year: i32, month: u32, day: u32) -> i64 {
        chrono::NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    async fn insert_rop(
        db: &Database,
        order: &str,
        start: Option<i64>,
        recommended: Option<f64>,
        planned: Option<f64>,
    ) {
        sqlx::query(
            "INSERT INTO rop_monitor \
             (process_order_number, actual_start_date, recommended_rop_abs_error, planned_rop_abs_error) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(order)
        .bind(start)
        .bind(recommended)
        .bind(planned)
        .execute(db.pool())
        .await
        .expect("insert rop row");
    }

    async fn insert_setup_time(
        db: &Database,
        order: &str,
        start: Option<i64>,
        recommended: Option<f64>,
        planned: Option<f64>,
    ) {
        sqlx::query(
            "INSERT INTO setup_time_monitor \
             (process_order_number, actual_start_date, recommended_st_abs_error, planned_st_abs_error) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(order)
        .bind(start)
        .bind(recommended)
        .bind(planned)
        .execute(db.pool())
        .await
        .expect("insert setup-time row");
    }

    #[tokio::test]
    async fn available_months_empty_table() {
        let db = test_db().await;
        let months = db.available_months(&ROP).await.unwrap();
        assert!(months.is_empty());
    }

    #[tokio::test]
    async fn available_months_newest_first_with_labels() {
        let db = test_db().await;
        insert_rop(&db, "PO-1", Some(ts(2024, 1, 10)), Some(1.0), Some(2.0)).await;
        insert_rop(&db, "PO-2", Some(ts(2024, 2, 5)), Some(1.0), Some(2.0)).await;
        insert_rop(&db, "PO-3", Some(ts(2024, 1, 20)), Some(1.0), Some(2.0)).await;
        // Undated rows never reach the picker.
        insert_rop(&db, "PO-4", None, Some(1.0), Some(2.0)).await;

        let months = db.available_months(&ROP).await.unwrap();
        let values: Vec<&str> = months.iter().map(|m| m.value.as_str()).collect();
        assert_eq!(values, vec!["2024-02", "2024-01"]);

        assert_eq!(months[0].label, "February 2024");
        assert_eq!(months[0].month, 2);
        assert_eq!(months[0].year, 2024);
    }

    #[tokio::test]
    async fn available_months_are_per_dataset() {
        let db = test_db().await;
        insert_rop(&db, "PO-1", Some(ts(2024, 1, 10)), Some(1.0), Some(2.0)).await;
        insert_setup_time(&db, "PO-9", Some(ts(2023, 6, 1)), Some(3.0), Some(4.0)).await;

        let rop = db.available_months(&ROP).await.unwrap();
        let st = db.available_months(&SETUP_TIME).await.unwrap();
        assert_eq!(rop[0].value, "2024-01");
        assert_eq!(st[0].value, "2023-06");
    }

    #[tokio::test]
    async fn metric_cards_zeros_when_month_has_no_rows() {
        let db = test_db().await;
        let cards = db.metric_cards(&ROP, "2024-01").await.unwrap();
        assert_eq!(cards.count, 0);
        assert_eq!(cards.aiml_metric, 0.0);
        assert_eq!(cards.planned_metric, 0.0);
    }

    #[tokio::test]
    async fn metric_cards_counts_distinct_orders_and_averages() {
        let db = test_db().await;
        // PO-1 appears twice — counted once.
        insert_rop(&db, "PO-1", Some(ts(2024, 1, 5)), Some(1.0), Some(2.0)).await;
        insert_rop(&db, "PO-1", Some(ts(2024, 1, 6)), Some(3.0), Some(4.0)).await;
        insert_rop(&db, "PO-2", Some(ts(2024, 1, 7)), Some(5.0), Some(6.0)).await;
        // Different month — excluded.
        insert_rop(&db, "PO-3", Some(ts(2024, 2, 1)), Some(100.0), Some(100.0)).await;

        let cards = db.metric_cards(&ROP, "2024-01").await.unwrap();
        assert_eq!(cards.count, 2);
        assert_eq!(cards.aiml_metric, 3.0);
        assert_eq!(cards.planned_metric, 4.0);
    }

    #[tokio::test]
    async fn metric_cards_requires_both_metrics() {
        let db = test_db().await;
        insert_rop(&db, "PO-1", Some(ts(2024, 1, 5)), Some(2.0), Some(4.0)).await;
        // One-sided rows are excluded from both means, not just the null side.
        insert_rop(&db, "PO-2", Some(ts(2024, 1, 6)), Some(100.0), None).await;
        insert_rop(&db, "PO-3", Some(ts(2024, 1, 7)), None, Some(100.0)).await;

        let cards = db.metric_cards(&ROP, "2024-01").await.unwrap();
        assert_eq!(cards.count, 1);
        assert_eq!(cards.aiml_metric, 2.0);
        assert_eq!(cards.planned_metric, 4.0);
    }

    #[tokio::test]
    async fn monthly_trends_chronological_across_years() {
        let db = test_db().await;
        insert_rop(&db, "PO-2", Some(ts(2024, 1, 5)), Some(3.0), Some(4.0)).await;
        insert_rop(&db, "PO-1", Some(ts(2023, 12, 5)), Some(1.0), Some(2.0)).await;

        let points = db.monthly_trends(&ROP).await.unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!((points[0].month.as_str(), points[0].year), ("December", 2023));
        assert_eq!((points[1].month.as_str(), points[1].year), ("January", 2024));
        assert_eq!(points[0].aiml_metric, 1.0);
        assert_eq!(points[1].count, 1);
    }

    #[tokio::test]
    async fn trend_cards_round_and_aggregate() {
        let db = test_db().await;
        // January mean aiml: (1.2495 + 1.2505) / 2 = 1.25
        insert_rop(&db, "PO-1", Some(ts(2024, 1, 5)), Some(1.2495), Some(2.0054)).await;
        insert_rop(&db, "PO-2", Some(ts(2024, 1, 6)), Some(1.2505), Some(2.0054)).await;
        // February mean aiml: 2.7534 → 2.75 (rounded); planned 3.0
        insert_rop(&db, "PO-3", Some(ts(2024, 2, 1)), Some(2.7534), Some(3.0)).await;

        let cards = db.metric_trend_cards(&ROP).await.unwrap();

        assert_eq!(cards.order_count.data, vec![2, 1]);
        assert_eq!(cards.order_count.total, 3);
        assert_eq!(
            cards.order_count.categories,
            vec!["January 2024", "February 2024"]
        );

        assert_eq!(cards.aiml_metric.data, vec![1.25, 2.75]);
        // Average of the rounded monthly means: (1.25 + 2.75) / 2 = 2.0
        assert_eq!(cards.aiml_metric.average, 2.0);

        assert_eq!(cards.planned_metric.data, vec![2.01, 3.0]);
    }

    #[tokio::test]
    async fn trend_cards_empty_dataset() {
        let db = test_db().await;
        let cards = db.metric_trend_cards(&ROP).await.unwrap();
        assert!(cards.order_count.data.is_empty());
        assert!(cards.order_count.categories.is_empty());
        assert_eq!(cards.order_count.total, 0);
        assert_eq!(cards.aiml_metric.average, 0.0);
        assert_eq!(cards.planned_metric.average, 0.0);
    }

    #[tokio::test]
    async fn month_option_serializes_camel_case() {
        let option = MonthOption {
            value: "2024-01".to_string(),
            label: "January 2024".to_string(),
            month: 1,
            year: 2024,
        };
        let json = serde_json::to_string(&option).unwrap();
        assert!(json.contains("\"value\":\"2024-01\""));
        assert!(json.contains("\"label\":\"January 2024\""));
    }

    #[tokio::test]
    async fn metric_cards_serialize_camel_case() {
        let cards = MetricCards {
            count: 3,
            aiml_metric: 1.5,
            planned_metric: 2.5,
        };
        let json = serde_json::to_string(&cards).unwrap();
        assert!(json.contains("\"count\":3"));
        assert!(json.contains("\"aimlMetric\":1.5"));
        assert!(json.contains("\"plannedMetric\":2.5"));
    }
}
