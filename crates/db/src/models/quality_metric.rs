//! Quality metric models and DTOs.
//!
//! Maps to the `quality_metrics` table. Rows are insert-only; every pass
//! writes a fresh row per (table, metric).

use gridwatch_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `quality_metrics` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QualityMetric {
    pub id: DbId,
    pub table_name: String,
    pub metric_name: String,
    pub metric_value: f64,
    pub total_records: i64,
    pub valid_records: i64,
    pub invalid_records: i64,
    pub calculated_at: Timestamp,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// DTO for inserting a new quality metric.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQualityMetric {
    pub table_name: String,
    pub metric_name: String,
    pub metric_value: f64,
    pub total_records: i64,
    pub valid_records: i64,
    pub period_start: Timestamp,
    pub period_end: Timestamp,
}

impl CreateQualityMetric {
    /// Records that did not satisfy the metric.
    pub fn invalid_records(&self) -> i64 {
        self.total_records - self.valid_records
    }
}

// ---------------------------------------------------------------------------
// Projections
// ---------------------------------------------------------------------------

/// Most recent value of one (table, metric) pair, with the value recorded
/// by the pass before it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LatestMetric {
    pub table_name: String,
    pub metric_name: String,
    pub metric_value: f64,
    pub total_records: i64,
    pub valid_records: i64,
    pub invalid_records: i64,
    pub calculated_at: Timestamp,
    pub previous_value: Option<f64>,
}
