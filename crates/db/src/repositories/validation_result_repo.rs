//! Repository for the `quality_validation_results` table.

use sqlx::{PgConnection, PgPool};

use crate::models::validation_result::{CreateValidationResult, ValidationResult};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "\
    id, table_name, total_records, passed, warnings, errors, pass_rate, \
    issues_by_type, checked_at";

pub struct ValidationResultRepo;

impl ValidationResultRepo {
    pub async fn create_in(
        conn: &mut PgConnection,
        dto: &CreateValidationResult,
    ) -> Result<ValidationResult, sqlx::Error> {
        let query = format!(
            "INSERT INTO quality_validation_results \
                (table_name, total_records, passed, warnings, errors, pass_rate, issues_by_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ValidationResult>(&query)
            .bind(&dto.table_name)
            .bind(dto.total_records)
            .bind(dto.passed)
            .bind(dto.warnings)
            .bind(dto.errors)
            .bind(dto.pass_rate)
            .bind(&dto.issues_by_type)
            .fetch_one(conn)
            .await
    }

    /// The most recent result for each table.
    pub async fn latest_per_table(pool: &PgPool) -> Result<Vec<ValidationResult>, sqlx::Error> {
        let query = format!(
            "SELECT DISTINCT ON (table_name) {COLUMNS} FROM quality_validation_results \
             ORDER BY table_name, checked_at DESC, id DESC"
        );
        sqlx::query_as::<_, ValidationResult>(&query)
            .fetch_all(pool)
            .await
    }
}
