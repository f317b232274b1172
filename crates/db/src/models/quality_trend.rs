//! Quality trend models and DTOs.
//!
//! Maps to the `quality_trends` table. At most one row exists per
//! (metric_name, period_type, period_start).

use gridwatch_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `quality_trends` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QualityTrend {
    pub id: DbId,
    pub metric_name: String,
    pub period_type: String,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
    pub avg_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub trend_direction: String,
    pub trend_percentage: Option<f64>,
    pub calculated_at: Timestamp,
}

/// DTO for inserting a trend row.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQualityTrend {
    pub metric_name: String,
    pub period_type: String,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
    pub avg_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub trend_direction: String,
    pub trend_percentage: Option<f64>,
}

/// One metric value with its metric name, used as trend input.
#[derive(Debug, Clone, FromRow)]
pub struct MetricSample {
    pub metric_name: String,
    pub metric_value: f64,
}
