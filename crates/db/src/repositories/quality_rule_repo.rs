//! Repository for the `quality_rules` table.

use gridwatch_core::types::DbId;
use sqlx::PgPool;

use crate::models::quality_rule::{CreateQualityRule, QualityRule};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, table_name, column_name, rule_type, rule_config, is_active, created_at, updated_at";

pub struct QualityRuleRepo;

impl QualityRuleRepo {
    /// List rules, optionally for one table, ordered by table then id.
    pub async fn list(
        pool: &PgPool,
        table_name: Option<&str>,
    ) -> Result<Vec<QualityRule>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM quality_rules \
             WHERE ($1::VARCHAR IS NULL OR table_name = $1) \
             ORDER BY table_name, id"
        );
        sqlx::query_as::<_, QualityRule>(&query)
            .bind(table_name)
            .fetch_all(pool)
            .await
    }

    /// Active rules for one table, in creation order.
    pub async fn list_active(
        pool: &PgPool,
        table_name: &str,
    ) -> Result<Vec<QualityRule>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM quality_rules \
             WHERE table_name = $1 AND is_active = true \
             ORDER BY id"
        );
        sqlx::query_as::<_, QualityRule>(&query)
            .bind(table_name)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<QualityRule>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM quality_rules WHERE id = $1");
        sqlx::query_as::<_, QualityRule>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &PgPool, dto: &CreateQualityRule) -> Result<QualityRule, sqlx::Error> {
        let query = format!(
            "INSERT INTO quality_rules (table_name, column_name, rule_type, rule_config, is_active) \
             VALUES ($1, $2, $3, $4, COALESCE($5, true)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QualityRule>(&query)
            .bind(&dto.table_name)
            .bind(&dto.column_name)
            .bind(&dto.rule_type)
            .bind(&dto.rule_config)
            .bind(dto.is_active)
            .fetch_one(pool)
            .await
    }

    /// Activate or deactivate a rule. Returns `None` if the rule does not exist.
    pub async fn set_active(
        pool: &PgPool,
        id: DbId,
        is_active: bool,
    ) -> Result<Option<QualityRule>, sqlx::Error> {
        let query = format!(
            "UPDATE quality_rules SET is_active = $2, updated_at = now() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QualityRule>(&query)
            .bind(id)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }
}
