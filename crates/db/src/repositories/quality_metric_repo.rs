//! Repository for the `quality_metrics` table.

use gridwatch_core::types::Timestamp;
use sqlx::{PgConnection, PgPool};

use crate::models::quality_metric::{CreateQualityMetric, LatestMetric, QualityMetric};
use crate::models::quality_trend::MetricSample;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, table_name, metric_name, metric_value, total_records, valid_records, \
    invalid_records, calculated_at, period_start, period_end";

pub struct QualityMetricRepo;

impl QualityMetricRepo {
    /// Insert a metric on an existing connection or transaction.
    pub async fn create_in(
        conn: &mut PgConnection,
        dto: &CreateQualityMetric,
    ) -> Result<QualityMetric, sqlx::Error> {
        let query = format!(
            "INSERT INTO quality_metrics \
                (table_name, metric_name, metric_value, total_records, valid_records, \
                 invalid_records, period_start, period_end) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QualityMetric>(&query)
            .bind(&dto.table_name)
            .bind(&dto.metric_name)
            .bind(dto.metric_value)
            .bind(dto.total_records)
            .bind(dto.valid_records)
            .bind(dto.invalid_records())
            .bind(dto.period_start)
            .bind(dto.period_end)
            .fetch_one(conn)
            .await
    }

    /// Latest value per (table, metric), with the value of the pass before.
    ///
    /// Ties on `calculated_at` are broken by id so overlapping passes still
    /// yield a single row per pair.
    pub async fn latest(
        pool: &PgPool,
        table_name: Option<&str>,
        limit: i64,
    ) -> Result<Vec<LatestMetric>, sqlx::Error> {
        sqlx::query_as::<_, LatestMetric>(
            "SELECT table_name, metric_name, metric_value, total_records, valid_records, \
                    invalid_records, calculated_at, previous_value \
             FROM ( \
                SELECT *, \
                    LAG(metric_value) OVER ( \
                        PARTITION BY table_name, metric_name ORDER BY calculated_at, id \
                    ) AS previous_value, \
                    ROW_NUMBER() OVER ( \
                        PARTITION BY table_name, metric_name ORDER BY calculated_at DESC, id DESC \
                    ) AS rn \
                FROM quality_metrics \
                WHERE ($1::VARCHAR IS NULL OR table_name = $1) \
             ) ranked \
             WHERE rn = 1 \
             ORDER BY calculated_at DESC, table_name, metric_name \
             LIMIT $2",
        )
        .bind(table_name)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    /// All metric values calculated in `[since, until)`, grouped by caller.
    pub async fn values_between(
        pool: &PgPool,
        since: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<MetricSample>, sqlx::Error> {
        sqlx::query_as::<_, MetricSample>(
            "SELECT metric_name, metric_value FROM quality_metrics \
             WHERE calculated_at >= $1 AND calculated_at < $2 \
             ORDER BY metric_name, calculated_at",
        )
        .bind(since)
        .bind(until)
        .fetch_all(pool)
        .await
    }
}
