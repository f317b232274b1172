//! Quality issue models and DTOs.

use gridwatch_core::issue_detection::IssueDraft;
use gridwatch_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A row from the `quality_issues` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QualityIssue {
    pub id: DbId,
    pub table_name: String,
    pub record_id: Option<DbId>,
    pub issue_type: String,
    pub description: String,
    pub severity: String,
    pub status: String,
    pub detected_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub resolution_notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Create DTO
// ---------------------------------------------------------------------------

/// DTO for inserting a new `OPEN` issue.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQualityIssue {
    pub table_name: String,
    pub record_id: Option<DbId>,
    pub issue_type: String,
    pub description: String,
    pub severity: String,
}

impl From<&IssueDraft> for CreateQualityIssue {
    fn from(draft: &IssueDraft) -> Self {
        Self {
            table_name: draft.table_name.clone(),
            record_id: draft.record_id,
            issue_type: draft.issue_type.clone(),
            description: draft.description.clone(),
            severity: draft.severity.as_str().to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Query DTOs
// ---------------------------------------------------------------------------

/// Filters for listing issues. `None` fields are not applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFilter {
    pub table_name: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

/// Issue count for one (severity, status) pair.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IssueCount {
    pub severity: String,
    pub status: String,
    pub count: i64,
}
