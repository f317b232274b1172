//! Per-table validation breakdown recorded by each pass.

use gridwatch_core::metrics::ValidationBreakdown;
use gridwatch_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `quality_validation_results` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ValidationResult {
    pub id: DbId,
    pub table_name: String,
    pub total_records: i64,
    pub passed: i64,
    pub warnings: i64,
    pub errors: i64,
    pub pass_rate: f64,
    pub issues_by_type: serde_json::Value,
    pub checked_at: Timestamp,
}

/// DTO for inserting a validation result.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateValidationResult {
    pub table_name: String,
    pub total_records: i64,
    pub passed: i64,
    pub warnings: i64,
    pub errors: i64,
    pub pass_rate: f64,
    pub issues_by_type: serde_json::Value,
}

impl CreateValidationResult {
    pub fn from_breakdown(table_name: &str, breakdown: &ValidationBreakdown) -> Self {
        Self {
            table_name: table_name.to_string(),
            total_records: breakdown.total_records,
            passed: breakdown.passed,
            warnings: breakdown.warnings,
            errors: breakdown.errors,
            pass_rate: breakdown.pass_rate,
            issues_by_type: serde_json::to_value(&breakdown.issues_by_type)
                .unwrap_or_else(|_| serde_json::json!({})),
        }
    }
}
