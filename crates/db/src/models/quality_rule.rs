//! Quality rule models and DTOs.
//!
//! Rules are configuration: created and toggled through the API, read by the
//! metric calculator, never modified by the engine.

use gridwatch_core::error::CoreError;
use gridwatch_core::rules::ColumnRule;
use gridwatch_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `quality_rules` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QualityRule {
    pub id: DbId,
    pub table_name: String,
    pub column_name: String,
    pub rule_type: String,
    pub rule_config: Option<serde_json::Value>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl QualityRule {
    /// Parse the stored row into a typed rule.
    pub fn to_column_rule(&self) -> Result<ColumnRule, CoreError> {
        ColumnRule::from_config(&self.column_name, &self.rule_type, self.rule_config.as_ref())
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// DTO for creating a rule.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQualityRule {
    pub table_name: String,
    pub column_name: String,
    pub rule_type: String,
    pub rule_config: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

/// DTO for activating or deactivating a rule.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateQualityRule {
    pub is_active: bool,
}
