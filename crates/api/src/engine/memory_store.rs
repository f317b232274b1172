//! In-memory [`QualityStore`] for unit tests.
//!
//! Mirrors the PostgreSQL semantics the engine relies on: atomic pass
//! commits, open-issue de-duplication, conditional resolve, and trend
//! uniqueness per (metric, period type, period start).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use gridwatch_core::monitored::{MonitoredRecord, MonitoredTable};
use gridwatch_core::quality_status::IssueStatus;
use gridwatch_core::types::{DbId, Timestamp};
use gridwatch_db::models::quality_issue::{
    CreateQualityIssue, IssueCount, IssueFilter, QualityIssue,
};
use gridwatch_db::models::quality_metric::{CreateQualityMetric, LatestMetric, QualityMetric};
use gridwatch_db::models::quality_rule::{CreateQualityRule, QualityRule};
use gridwatch_db::models::quality_trend::{CreateQualityTrend, MetricSample, QualityTrend};
use gridwatch_db::models::validation_result::ValidationResult;
use gridwatch_db::repositories::quality_issue_repo::DEFAULT_ISSUE_LIMIT;
use gridwatch_db::repositories::{PassCommit, PassWrite};

use super::store::QualityStore;

type StoreResult<T> = Result<T, sqlx::Error>;

#[derive(Default)]
struct Tables {
    next_id: DbId,
    populations: HashMap<MonitoredTable, Vec<MonitoredRecord>>,
    ingested_at: HashMap<MonitoredTable, Timestamp>,
    rules: Vec<QualityRule>,
    metrics: Vec<QualityMetric>,
    validation_results: Vec<ValidationResult>,
    issues: Vec<QualityIssue>,
    trends: Vec<QualityTrend>,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }

    fn insert_metric(&mut self, dto: &CreateQualityMetric, calculated_at: Timestamp) {
        let id = self.next_id();
        self.metrics.push(QualityMetric {
            id,
            table_name: dto.table_name.clone(),
            metric_name: dto.metric_name.clone(),
            metric_value: dto.metric_value,
            total_records: dto.total_records,
            valid_records: dto.valid_records,
            invalid_records: dto.invalid_records(),
            calculated_at,
            period_start: dto.period_start,
            period_end: dto.period_end,
        });
    }

    fn insert_issue(&mut self, dto: &CreateQualityIssue) -> QualityIssue {
        let issue = QualityIssue {
            id: self.next_id(),
            table_name: dto.table_name.clone(),
            record_id: dto.record_id,
            issue_type: dto.issue_type.clone(),
            description: dto.description.clone(),
            severity: dto.severity.clone(),
            status: IssueStatus::Open.as_str().to_string(),
            detected_at: Utc::now(),
            resolved_at: None,
            resolution_notes: None,
        };
        self.issues.push(issue.clone());
        issue
    }

    fn has_open_issue(&self, dto: &CreateQualityIssue) -> bool {
        dto.record_id.is_some()
            && self.issues.iter().any(|i| {
                i.status == IssueStatus::Open.as_str()
                    && i.table_name == dto.table_name
                    && i.record_id == dto.record_id
                    && i.issue_type == dto.issue_type
            })
    }
}

/// Mutex-backed store with switchable failures.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_loads: AtomicBool,
    fail_commit: AtomicBool,
    fail_issue_writes: AtomicBool,
    unreachable: AtomicBool,
}

fn unavailable() -> sqlx::Error {
    sqlx::Error::PoolTimedOut
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    // -- seeding --

    pub fn set_population(&self, table: MonitoredTable, records: Vec<MonitoredRecord>) {
        self.lock().populations.insert(table, records);
    }

    pub fn set_ingested_at(&self, table: MonitoredTable, at: Timestamp) {
        self.lock().ingested_at.insert(table, at);
    }

    pub fn add_rule(
        &self,
        table_name: &str,
        column_name: &str,
        rule_type: &str,
        rule_config: Option<serde_json::Value>,
    ) -> QualityRule {
        let mut tables = self.lock();
        let now = Utc::now();
        let rule = QualityRule {
            id: tables.next_id(),
            table_name: table_name.to_string(),
            column_name: column_name.to_string(),
            rule_type: rule_type.to_string(),
            rule_config,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.rules.push(rule.clone());
        rule
    }

    /// Record a metric as if a pass had written it at `calculated_at`.
    pub fn add_metric(
        &self,
        table_name: &str,
        metric_name: &str,
        value: f64,
        calculated_at: Timestamp,
    ) {
        let dto = CreateQualityMetric {
            table_name: table_name.to_string(),
            metric_name: metric_name.to_string(),
            metric_value: value,
            total_records: 100,
            valid_records: value.round() as i64,
            period_start: calculated_at,
            period_end: calculated_at,
        };
        self.lock().insert_metric(&dto, calculated_at);
    }

    pub fn add_issue(&self, dto: &CreateQualityIssue) -> QualityIssue {
        self.lock().insert_issue(dto)
    }

    // -- failure switches --

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_commit(&self, fail: bool) {
        self.fail_commit.store(fail, Ordering::SeqCst);
    }

    pub fn fail_issue_writes(&self, fail: bool) {
        self.fail_issue_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    // -- inspection --

    pub fn metrics(&self) -> Vec<QualityMetric> {
        self.lock().metrics.clone()
    }

    pub fn issues(&self) -> Vec<QualityIssue> {
        self.lock().issues.clone()
    }

    pub fn validation_results(&self) -> Vec<ValidationResult> {
        self.lock().validation_results.clone()
    }

    pub fn trends(&self) -> Vec<QualityTrend> {
        self.lock().trends.clone()
    }
}

#[async_trait]
impl QualityStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(())
    }

    async fn load_population(
        &self,
        table: MonitoredTable,
        _since: Timestamp,
    ) -> StoreResult<Vec<MonitoredRecord>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.lock().populations.get(&table).cloned().unwrap_or_default())
    }

    async fn latest_ingested_at(&self, table: MonitoredTable) -> StoreResult<Option<Timestamp>> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.lock().ingested_at.get(&table).copied())
    }

    async fn active_rules(&self, table_name: &str) -> StoreResult<Vec<QualityRule>> {
        Ok(self
            .lock()
            .rules
            .iter()
            .filter(|r| r.is_active && r.table_name == table_name)
            .cloned()
            .collect())
    }

    async fn list_rules(&self, table_name: Option<&str>) -> StoreResult<Vec<QualityRule>> {
        Ok(self
            .lock()
            .rules
            .iter()
            .filter(|r| table_name.map_or(true, |t| r.table_name == t))
            .cloned()
            .collect())
    }

    async fn create_rule(&self, dto: &CreateQualityRule) -> StoreResult<QualityRule> {
        let mut rule = self.add_rule(
            &dto.table_name,
            &dto.column_name,
            &dto.rule_type,
            dto.rule_config.clone(),
        );
        if let Some(false) = dto.is_active {
            rule = self
                .set_rule_active(rule.id, false)
                .await?
                .unwrap_or(rule);
        }
        Ok(rule)
    }

    async fn set_rule_active(
        &self,
        id: DbId,
        is_active: bool,
    ) -> StoreResult<Option<QualityRule>> {
        let mut tables = self.lock();
        Ok(tables.rules.iter_mut().find(|r| r.id == id).map(|r| {
            r.is_active = is_active;
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn commit_pass(&self, pass: &PassWrite) -> StoreResult<PassCommit> {
        if self.fail_commit.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        let mut tables = self.lock();
        let mut commit = PassCommit::default();
        let now = Utc::now();

        for metric in &pass.metrics {
            tables.insert_metric(metric, now);
            commit.metrics_written += 1;
        }
        for result in &pass.validation_results {
            let id = tables.next_id();
            tables.validation_results.push(ValidationResult {
                id,
                table_name: result.table_name.clone(),
                total_records: result.total_records,
                passed: result.passed,
                warnings: result.warnings,
                errors: result.errors,
                pass_rate: result.pass_rate,
                issues_by_type: result.issues_by_type.clone(),
                checked_at: now,
            });
            commit.validation_results_written += 1;
        }
        for issue in &pass.issues {
            if !tables.has_open_issue(issue) {
                tables.insert_issue(issue);
                commit.issues_created += 1;
            }
        }
        Ok(commit)
    }

    async fn create_issue(&self, dto: &CreateQualityIssue) -> StoreResult<QualityIssue> {
        if self.fail_issue_writes.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.lock().insert_issue(dto))
    }

    async fn find_issue(&self, id: DbId) -> StoreResult<Option<QualityIssue>> {
        Ok(self.lock().issues.iter().find(|i| i.id == id).cloned())
    }

    async fn list_issues(&self, filter: &IssueFilter) -> StoreResult<Vec<QualityIssue>> {
        let tables = self.lock();
        let mut issues: Vec<QualityIssue> = tables
            .issues
            .iter()
            .filter(|i| filter.table_name.as_ref().map_or(true, |t| &i.table_name == t))
            .filter(|i| filter.severity.as_ref().map_or(true, |s| &i.severity == s))
            .filter(|i| filter.status.as_ref().map_or(true, |s| &i.status == s))
            .cloned()
            .collect();
        issues.sort_by(|a, b| b.detected_at.cmp(&a.detected_at).then(b.id.cmp(&a.id)));
        issues.truncate(filter.limit.unwrap_or(DEFAULT_ISSUE_LIMIT).max(0) as usize);
        Ok(issues)
    }

    async fn resolve_issue(&self, id: DbId, notes: &str) -> StoreResult<Option<QualityIssue>> {
        let mut tables = self.lock();
        Ok(tables
            .issues
            .iter_mut()
            .find(|i| i.id == id && i.status == IssueStatus::Open.as_str())
            .map(|i| {
                i.status = IssueStatus::Resolved.as_str().to_string();
                i.resolved_at = Some(Utc::now());
                i.resolution_notes = Some(notes.to_string());
                i.clone()
            }))
    }

    async fn issue_counts(&self) -> StoreResult<Vec<IssueCount>> {
        let tables = self.lock();
        let mut counts: HashMap<(String, String), i64> = HashMap::new();
        for issue in &tables.issues {
            *counts
                .entry((issue.severity.clone(), issue.status.clone()))
                .or_insert(0) += 1;
        }
        let mut counts: Vec<IssueCount> = counts
            .into_iter()
            .map(|((severity, status), count)| IssueCount {
                severity,
                status,
                count,
            })
            .collect();
        counts.sort_by(|a, b| (&a.severity, &a.status).cmp(&(&b.severity, &b.status)));
        Ok(counts)
    }

    async fn latest_metrics(
        &self,
        table_name: Option<&str>,
        limit: i64,
    ) -> StoreResult<Vec<LatestMetric>> {
        let tables = self.lock();
        let mut history: HashMap<(String, String), Vec<&QualityMetric>> = HashMap::new();
        for m in tables
            .metrics
            .iter()
            .filter(|m| table_name.map_or(true, |t| m.table_name == t))
        {
            history
                .entry((m.table_name.clone(), m.metric_name.clone()))
                .or_default()
                .push(m);
        }

        let mut latest: Vec<LatestMetric> = history
            .into_values()
            .filter_map(|mut rows| {
                rows.sort_by(|a, b| (a.calculated_at, a.id).cmp(&(b.calculated_at, b.id)));
                let last = rows.pop()?;
                Some(LatestMetric {
                    table_name: last.table_name.clone(),
                    metric_name: last.metric_name.clone(),
                    metric_value: last.metric_value,
                    total_records: last.total_records,
                    valid_records: last.valid_records,
                    invalid_records: last.invalid_records,
                    calculated_at: last.calculated_at,
                    previous_value: rows.last().map(|p| p.metric_value),
                })
            })
            .collect();
        latest.sort_by(|a, b| {
            b.calculated_at
                .cmp(&a.calculated_at)
                .then_with(|| a.table_name.cmp(&b.table_name))
                .then_with(|| a.metric_name.cmp(&b.metric_name))
        });
        latest.truncate(limit.max(0) as usize);
        Ok(latest)
    }

    async fn latest_validation_results(&self) -> StoreResult<Vec<ValidationResult>> {
        let tables = self.lock();
        let mut latest: HashMap<&str, &ValidationResult> = HashMap::new();
        for r in &tables.validation_results {
            let entry = latest.entry(r.table_name.as_str()).or_insert(r);
            if (r.checked_at, r.id) > (entry.checked_at, entry.id) {
                *entry = r;
            }
        }
        let mut rows: Vec<ValidationResult> = latest.into_values().cloned().collect();
        rows.sort_by(|a, b| a.table_name.cmp(&b.table_name));
        Ok(rows)
    }

    async fn metric_values_between(
        &self,
        since: Timestamp,
        until: Timestamp,
    ) -> StoreResult<Vec<MetricSample>> {
        Ok(self
            .lock()
            .metrics
            .iter()
            .filter(|m| m.calculated_at >= since && m.calculated_at < until)
            .map(|m| MetricSample {
                metric_name: m.metric_name.clone(),
                metric_value: m.metric_value,
            })
            .collect())
    }

    async fn create_trend_if_absent(
        &self,
        dto: &CreateQualityTrend,
    ) -> StoreResult<Option<QualityTrend>> {
        let mut tables = self.lock();
        let exists = tables.trends.iter().any(|t| {
            t.metric_name == dto.metric_name
                && t.period_type == dto.period_type
                && t.period_start == dto.period_start
        });
        if exists {
            return Ok(None);
        }
        let trend = QualityTrend {
            id: tables.next_id(),
            metric_name: dto.metric_name.clone(),
            period_type: dto.period_type.clone(),
            period_start: dto.period_start,
            period_end: dto.period_end,
            avg_score: dto.avg_score,
            min_score: dto.min_score,
            max_score: dto.max_score,
            trend_direction: dto.trend_direction.clone(),
            trend_percentage: dto.trend_percentage,
            calculated_at: Utc::now(),
        };
        tables.trends.push(trend.clone());
        Ok(Some(trend))
    }

    async fn list_trends(
        &self,
        metric_name: Option<&str>,
        period_type: &str,
        since: Timestamp,
    ) -> StoreResult<Vec<QualityTrend>> {
        let mut rows: Vec<QualityTrend> = self
            .lock()
            .trends
            .iter()
            .filter(|t| t.period_type == period_type && t.period_start >= since)
            .filter(|t| metric_name.map_or(true, |m| t.metric_name == m))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.period_start
                .cmp(&b.period_start)
                .then_with(|| a.metric_name.cmp(&b.metric_name))
        });
        Ok(rows)
    }
}
