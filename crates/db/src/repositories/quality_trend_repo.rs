//! Repository for the `quality_trends` table.

use gridwatch_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::quality_trend::{CreateQualityTrend, QualityTrend};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, metric_name, period_type, period_start, period_end, avg_score, min_score, \
    max_score, trend_direction, trend_percentage, calculated_at";

pub struct QualityTrendRepo;

impl QualityTrendRepo {
    /// Insert a trend row unless one already exists for the same
    /// (metric, period type, period start).
    ///
    /// Returns `None` when the row already existed.
    pub async fn create_if_absent(
        pool: &PgPool,
        dto: &CreateQualityTrend,
    ) -> Result<Option<QualityTrend>, sqlx::Error> {
        let query = format!(
            "INSERT INTO quality_trends \
                (metric_name, period_type, period_start, period_end, avg_score, min_score, \
                 max_score, trend_direction, trend_percentage) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (metric_name, period_type, period_start) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QualityTrend>(&query)
            .bind(&dto.metric_name)
            .bind(&dto.period_type)
            .bind(dto.period_start)
            .bind(dto.period_end)
            .bind(dto.avg_score)
            .bind(dto.min_score)
            .bind(dto.max_score)
            .bind(&dto.trend_direction)
            .bind(dto.trend_percentage)
            .fetch_optional(pool)
            .await
    }

    /// Trend rows of one period type starting at or after `since`, oldest
    /// first. `metric_name` narrows to a single metric.
    pub async fn list(
        pool: &PgPool,
        metric_name: Option<&str>,
        period_type: &str,
        since: Timestamp,
    ) -> Result<Vec<QualityTrend>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM quality_trends \
             WHERE period_type = $1 \
               AND period_start >= $2 \
               AND ($3::VARCHAR IS NULL OR metric_name = $3) \
             ORDER BY period_start, metric_name"
        );
        sqlx::query_as::<_, QualityTrend>(&query)
            .bind(period_type)
            .bind(since)
            .bind(metric_name)
            .fetch_all(pool)
            .await
    }
}
