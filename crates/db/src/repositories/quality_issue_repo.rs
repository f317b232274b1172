//! Repository for the `quality_issues` table.

use gridwatch_core::types::DbId;
use sqlx::{PgConnection, PgPool};

use crate::models::quality_issue::{CreateQualityIssue, IssueCount, IssueFilter, QualityIssue};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, table_name, record_id, issue_type, description, severity, status, \
    detected_at, resolved_at, resolution_notes";

/// Default page size for [`QualityIssueRepo::list`].
pub const DEFAULT_ISSUE_LIMIT: i64 = 100;

pub struct QualityIssueRepo;

impl QualityIssueRepo {
    /// Insert an `OPEN` issue.
    pub async fn create(
        pool: &PgPool,
        dto: &CreateQualityIssue,
    ) -> Result<QualityIssue, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::create_in(&mut *conn, dto).await
    }

    /// Insert an `OPEN` issue on an existing connection or transaction.
    pub async fn create_in(
        conn: &mut PgConnection,
        dto: &CreateQualityIssue,
    ) -> Result<QualityIssue, sqlx::Error> {
        let query = format!(
            "INSERT INTO quality_issues \
                (table_name, record_id, issue_type, description, severity) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QualityIssue>(&query)
            .bind(&dto.table_name)
            .bind(dto.record_id)
            .bind(&dto.issue_type)
            .bind(&dto.description)
            .bind(&dto.severity)
            .fetch_one(conn)
            .await
    }

    /// Insert a record-level issue unless an `OPEN` issue with the same
    /// (table, record, type) already exists.
    ///
    /// Backed by the `uq_quality_issues_open_record` partial index, so two
    /// transactions racing on the same record insert one row between them.
    /// Returns `None` when the insert was skipped.
    pub async fn create_if_absent_in(
        conn: &mut PgConnection,
        dto: &CreateQualityIssue,
    ) -> Result<Option<QualityIssue>, sqlx::Error> {
        let query = format!(
            "INSERT INTO quality_issues \
                (table_name, record_id, issue_type, description, severity) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (table_name, record_id, issue_type) \
                WHERE status = 'OPEN' AND record_id IS NOT NULL \
             DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QualityIssue>(&query)
            .bind(&dto.table_name)
            .bind(dto.record_id)
            .bind(&dto.issue_type)
            .bind(&dto.description)
            .bind(&dto.severity)
            .fetch_optional(conn)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<QualityIssue>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM quality_issues WHERE id = $1");
        sqlx::query_as::<_, QualityIssue>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List issues matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &IssueFilter,
    ) -> Result<Vec<QualityIssue>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM quality_issues \
             WHERE ($1::VARCHAR IS NULL OR table_name = $1) \
               AND ($2::VARCHAR IS NULL OR severity = $2) \
               AND ($3::VARCHAR IS NULL OR status = $3) \
             ORDER BY detected_at DESC, id DESC \
             LIMIT $4"
        );
        sqlx::query_as::<_, QualityIssue>(&query)
            .bind(&filter.table_name)
            .bind(&filter.severity)
            .bind(&filter.status)
            .bind(filter.limit.unwrap_or(DEFAULT_ISSUE_LIMIT))
            .fetch_all(pool)
            .await
    }

    /// Mark an `OPEN` issue resolved.
    ///
    /// Returns `None` if the issue does not exist or is no longer `OPEN`; the
    /// row is left untouched in both cases.
    pub async fn resolve(
        pool: &PgPool,
        id: DbId,
        resolution_notes: &str,
    ) -> Result<Option<QualityIssue>, sqlx::Error> {
        let query = format!(
            "UPDATE quality_issues SET \
                status = 'RESOLVED', \
                resolved_at = now(), \
                resolution_notes = $2 \
             WHERE id = $1 AND status = 'OPEN' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QualityIssue>(&query)
            .bind(id)
            .bind(resolution_notes)
            .fetch_optional(pool)
            .await
    }

    /// Issue counts grouped by severity and status.
    pub async fn count_by_severity_and_status(
        pool: &PgPool,
    ) -> Result<Vec<IssueCount>, sqlx::Error> {
        sqlx::query_as::<_, IssueCount>(
            "SELECT severity, status, COUNT(*)::BIGINT AS count \
             FROM quality_issues \
             GROUP BY severity, status \
             ORDER BY severity, status",
        )
        .fetch_all(pool)
        .await
    }
}
