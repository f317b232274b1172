//! Persistence seam of the quality engine.
//!
//! [`QualityStore`] is what the service and monitor depend on. The
//! production implementation [`PgQualityStore`] delegates to the repository
//! structs in `gridwatch-db`; tests use an in-memory store.

use async_trait::async_trait;
use gridwatch_core::monitored::{MonitoredRecord, MonitoredTable};
use gridwatch_core::types::{DbId, Timestamp};
use gridwatch_db::models::quality_issue::{
    CreateQualityIssue, IssueCount, IssueFilter, QualityIssue,
};
use gridwatch_db::models::quality_metric::LatestMetric;
use gridwatch_db::models::quality_rule::{CreateQualityRule, QualityRule};
use gridwatch_db::models::quality_trend::{CreateQualityTrend, MetricSample, QualityTrend};
use gridwatch_db::models::validation_result::ValidationResult;
use gridwatch_db::repositories::{
    MonitoredTableRepo, PassCommit, PassWrite, QualityIssueRepo, QualityMetricRepo,
    QualityPassRepo, QualityRuleRepo, QualityTrendRepo, ValidationResultRepo,
};
use gridwatch_db::DbPool;

type StoreResult<T> = Result<T, sqlx::Error>;

#[async_trait]
pub trait QualityStore: Send + Sync {
    /// Cheap reachability check.
    async fn ping(&self) -> StoreResult<()>;

    // -- monitored tables (read-only) --

    async fn load_population(
        &self,
        table: MonitoredTable,
        since: Timestamp,
    ) -> StoreResult<Vec<MonitoredRecord>>;

    async fn latest_ingested_at(&self, table: MonitoredTable) -> StoreResult<Option<Timestamp>>;

    // -- rules --

    async fn active_rules(&self, table_name: &str) -> StoreResult<Vec<QualityRule>>;

    async fn list_rules(&self, table_name: Option<&str>) -> StoreResult<Vec<QualityRule>>;

    async fn create_rule(&self, dto: &CreateQualityRule) -> StoreResult<QualityRule>;

    async fn set_rule_active(&self, id: DbId, is_active: bool)
        -> StoreResult<Option<QualityRule>>;

    // -- passes and issues --

    /// Persist a whole pass atomically.
    async fn commit_pass(&self, pass: &PassWrite) -> StoreResult<PassCommit>;

    async fn create_issue(&self, dto: &CreateQualityIssue) -> StoreResult<QualityIssue>;

    async fn find_issue(&self, id: DbId) -> StoreResult<Option<QualityIssue>>;

    async fn list_issues(&self, filter: &IssueFilter) -> StoreResult<Vec<QualityIssue>>;

    /// Resolve an `OPEN` issue; `None` when it is missing or not open.
    async fn resolve_issue(&self, id: DbId, notes: &str) -> StoreResult<Option<QualityIssue>>;

    async fn issue_counts(&self) -> StoreResult<Vec<IssueCount>>;

    // -- metrics, results and trends --

    async fn latest_metrics(
        &self,
        table_name: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<LatestMetric>>;

    async fn latest_validation_results(&self) -> StoreResult<Vec<ValidationResult>>;

    async fn metric_values_between(
        &self,
        since: Timestamp,
        until: Timestamp,
    ) -> StoreResult<Vec<MetricSample>>;

    async fn create_trend_if_absent(
        &self,
        dto: &CreateQualityTrend,
    ) -> StoreResult<Option<QualityTrend>>;

    async fn list_trends(
        &self,
        metric_name: Option<&str>,
        period_type: &str,
        since: Timestamp,
    ) -> StoreResult<Vec<QualityTrend>>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// [`QualityStore`] backed by the PostgreSQL pool.
#[derive(Clone)]
pub struct PgQualityStore {
    pool: DbPool,
}

impl PgQualityStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QualityStore for PgQualityStore {
    async fn ping(&self) -> StoreResult<()> {
        gridwatch_db::health_check(&self.pool).await
    }

    async fn load_population(
        &self,
        table: MonitoredTable,
        since: Timestamp,
    ) -> StoreResult<Vec<MonitoredRecord>> {
        MonitoredTableRepo::load_window(&self.pool, table, since).await
    }

    async fn latest_ingested_at(&self, table: MonitoredTable) -> StoreResult<Option<Timestamp>> {
        MonitoredTableRepo::latest_ingested_at(&self.pool, table).await
    }

    async fn active_rules(&self, table_name: &str) -> StoreResult<Vec<QualityRule>> {
        QualityRuleRepo::list_active(&self.pool, table_name).await
    }

    async fn list_rules(&self, table_name: Option<&str>) -> StoreResult<Vec<QualityRule>> {
        QualityRuleRepo::list(&self.pool, table_name).await
    }

    async fn create_rule(&self, dto: &CreateQualityRule) -> StoreResult<QualityRule> {
        QualityRuleRepo::create(&self.pool, dto).await
    }

    async fn set_rule_active(
        &self,
        id: DbId,
        is_active: bool,
    ) -> StoreResult<Option<QualityRule>> {
        QualityRuleRepo::set_active(&self.pool, id, is_active).await
    }

    async fn commit_pass(&self, pass: &PassWrite) -> StoreResult<PassCommit> {
        QualityPassRepo::commit(&self.pool, pass).await
    }

    async fn create_issue(&self, dto: &CreateQualityIssue) -> StoreResult<QualityIssue> {
        QualityIssueRepo::create(&self.pool, dto).await
    }

    async fn find_issue(&self, id: DbId) -> StoreResult<Option<QualityIssue>> {
        QualityIssueRepo::find_by_id(&self.pool, id).await
    }

    async fn list_issues(&self, filter: &IssueFilter) -> StoreResult<Vec<QualityIssue>> {
        QualityIssueRepo::list(&self.pool, filter).await
    }

    async fn resolve_issue(&self, id: DbId, notes: &str) -> StoreResult<Option<QualityIssue>> {
        QualityIssueRepo::resolve(&self.pool, id, notes).await
    }

    async fn issue_counts(&self) -> StoreResult<Vec<IssueCount>> {
        QualityIssueRepo::count_by_severity_and_status(&self.pool).await
    }

    async fn latest_metrics(
        &self,
        table_name: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<LatestMetric>> {
        QualityMetricRepo::latest(&self.pool, table_name, limit).await
    }

    async fn latest_validation_results(&self) -> StoreResult<Vec<ValidationResult>> {
        ValidationResultRepo::latest_per_table(&self.pool).await
    }

    async fn metric_values_between(
        &self,
        since: Timestamp,
        until: Timestamp,
    ) -> StoreResult<Vec<MetricSample>> {
        QualityMetricRepo::values_between(&self.pool, since, until).await
    }

    async fn create_trend_if_absent(
        &self,
        dto: &CreateQualityTrend,
    ) -> StoreResult<Option<QualityTrend>> {
        QualityTrendRepo::create_if_absent(&self.pool, dto).await
    }

    async fn list_trends(
        &self,
        metric_name: Option<&str>,
        period_type: &str,
        since: Timestamp,
    ) -> StoreResult<Vec<QualityTrend>> {
        QualityTrendRepo::list(&self.pool, metric_name, period_type, since).await
    }
}
