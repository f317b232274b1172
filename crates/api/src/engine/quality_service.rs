//! The quality service: runs passes and serves read models over the store.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use gridwatch_core::error::CoreError;
use gridwatch_core::issue_detection::detect_issues;
use gridwatch_core::metrics::{MetricCalculator, TableScores, METRIC_OVERALL, SYSTEM_OVERALL_TABLE};
use gridwatch_core::monitored::{MonitoredTable, ALL_TABLES};
use gridwatch_core::quality_status::{IssueSeverity, IssueStatus};
use gridwatch_core::rules::ColumnRule;
use gridwatch_core::scoring::{
    format_change, freshness_score, overall_score, score_label, status_from_score,
    system_health_score, StatusBand,
};
use gridwatch_core::trends::{mean, summarize, PeriodType};
use gridwatch_core::types::{DbId, Timestamp};
use gridwatch_db::models::quality_issue::{CreateQualityIssue, IssueFilter, QualityIssue};
use gridwatch_db::models::quality_metric::{CreateQualityMetric, LatestMetric};
use gridwatch_db::models::quality_rule::{CreateQualityRule, QualityRule};
use gridwatch_db::models::quality_trend::{CreateQualityTrend, MetricSample, QualityTrend};
use gridwatch_db::models::validation_result::CreateValidationResult;
use gridwatch_db::repositories::PassWrite;
use serde::Serialize;
use serde_json::json;

use super::store::QualityStore;
use super::QualityError;

/// Number of open issues shown on the dashboard.
pub const DASHBOARD_RECENT_ISSUES: i64 = 10;
/// Days of DAILY trend rows shown on the dashboard.
pub const DASHBOARD_TREND_DAYS: i64 = 30;
const DASHBOARD_METRIC_LIMIT: i64 = 50;

// ---------------------------------------------------------------------------
// Pass result
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemHealth {
    pub database_reachable: bool,
    pub data_freshness: f64,
    pub health_score: f64,
}

/// Outcome of evaluating one monitored table within a pass.
#[derive(Debug, Clone, Serialize)]
pub struct TableCheck {
    pub table_name: String,
    pub window_start: Timestamp,
    pub window_end: Timestamp,
    pub scores: TableScores,
    pub issues_detected: usize,
}

/// Everything one comprehensive quality pass computed and persisted.
#[derive(Debug, Clone, Serialize)]
pub struct QualityCheckResult {
    pub overall_score: f64,
    pub status: StatusBand,
    pub tables: Vec<TableCheck>,
    pub system_health: SystemHealth,
    /// Record-level issues found by the detector.
    pub issues_detected: usize,
    /// Of those, how many were new (not already open).
    pub issues_created: usize,
    pub checked_at: Timestamp,
}

impl QualityCheckResult {
    pub fn table(&self, table: MonitoredTable) -> Option<&TableCheck> {
        self.tables.iter().find(|t| t.table_name == table.name())
    }

    /// Payload of the `quality.check_completed` event.
    pub fn event_payload(&self) -> serde_json::Value {
        let tables: serde_json::Map<String, serde_json::Value> = self
            .tables
            .iter()
            .map(|t| {
                (
                    t.table_name.clone(),
                    json!({
                        "completeness": t.scores.completeness_score,
                        "accuracy": t.scores.accuracy_score,
                        "consistency": t.scores.consistency_score,
                    }),
                )
            })
            .collect();
        json!({
            "overall_score": self.overall_score,
            "tables": tables,
            "system_health": self.system_health,
            "timestamp": self.checked_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// A labeled dashboard tile for the latest value of one metric.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreEntry {
    pub name: String,
    pub table_name: String,
    pub metric_name: String,
    pub score: f64,
    pub status: StatusBand,
    pub change: String,
    pub description: String,
    pub last_calculated: Timestamp,
}

impl From<&LatestMetric> for ScoreEntry {
    fn from(m: &LatestMetric) -> Self {
        Self {
            name: score_label(&m.table_name, &m.metric_name),
            table_name: m.table_name.clone(),
            metric_name: m.metric_name.clone(),
            score: m.metric_value,
            status: status_from_score(m.metric_value),
            change: format_change(m.metric_value, m.previous_value),
            description: format!(
                "{} of {} records valid",
                m.valid_records, m.total_records
            ),
            last_calculated: m.calculated_at,
        }
    }
}

/// Latest validation breakdown of one monitored table.
///
/// A table that has never been checked reports zeros and no `last_check`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationView {
    pub table_name: String,
    pub total_records: i64,
    pub passed: i64,
    pub warnings: i64,
    pub errors: i64,
    pub pass_rate: f64,
    pub issues_by_type: serde_json::Value,
    pub last_check: Option<Timestamp>,
}

impl ValidationView {
    fn unchecked(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            total_records: 0,
            passed: 0,
            warnings: 0,
            errors: 0,
            pass_rate: 0.0,
            issues_by_type: json!({}),
            last_check: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub quality_scores: Vec<ScoreEntry>,
    pub validation_results: Vec<ValidationView>,
    pub recent_issues: Vec<QualityIssue>,
    pub trends: Vec<QualityTrend>,
    pub last_updated: Timestamp,
}

/// Live scores over a look-back window plus the open issue backlog.
#[derive(Debug, Clone, Serialize)]
pub struct QualitySummary {
    pub days_back: i64,
    pub tables: Vec<TableScores>,
    pub open_issues: i64,
    pub open_issues_by_severity: BTreeMap<String, i64>,
    pub last_updated: Timestamp,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Evaluates the monitored tables and exposes the stored quality history.
///
/// Stateless apart from the store handle; safe to share behind `Arc` and to
/// call concurrently.
pub struct QualityService {
    store: Arc<dyn QualityStore>,
}

impl QualityService {
    pub fn new(store: Arc<dyn QualityStore>) -> Self {
        Self { store }
    }

    pub async fn ping(&self) -> Result<(), QualityError> {
        Ok(self.store.ping().await?)
    }

    /// Run one pass over every monitored table and persist it atomically.
    pub async fn run_comprehensive_quality_check(&self) -> Result<QualityCheckResult, QualityError> {
        self.run_check_at(chrono::Utc::now()).await
    }

    pub(crate) async fn run_check_at(
        &self,
        now: Timestamp,
    ) -> Result<QualityCheckResult, QualityError> {
        let mut pass = PassWrite::default();
        let mut tables = Vec::with_capacity(ALL_TABLES.len());

        for &table in ALL_TABLES {
            let rules = self.rules_for(table).await?;
            let calculator = MetricCalculator::new(table, &rules)?;
            let window_start = now - table.window();
            let records = self.store.load_population(table, window_start).await?;

            let scores = calculator.evaluate(&records);
            let drafts = detect_issues(table, &records);

            tracing::debug!(
                table = table.name(),
                total = scores.total_records,
                completeness = scores.completeness_score,
                accuracy = scores.accuracy_score,
                consistency = scores.consistency_score,
                issues = drafts.len(),
                "Table evaluated",
            );

            for (metric_name, value, valid) in scores.dimensions() {
                pass.metrics.push(CreateQualityMetric {
                    table_name: table.name().to_string(),
                    metric_name: metric_name.to_string(),
                    metric_value: value,
                    total_records: scores.total_records,
                    valid_records: valid,
                    period_start: window_start,
                    period_end: now,
                });
            }
            pass.validation_results
                .push(CreateValidationResult::from_breakdown(table.name(), &scores.validation));
            pass.issues.extend(drafts.iter().map(CreateQualityIssue::from));

            tables.push(TableCheck {
                table_name: table.name().to_string(),
                window_start,
                window_end: now,
                scores,
                issues_detected: drafts.len(),
            });
        }

        let completeness: Vec<f64> = tables
            .iter()
            .map(|t| t.scores.completeness_score)
            .collect();
        let overall = overall_score(&completeness);

        pass.metrics.push(CreateQualityMetric {
            table_name: SYSTEM_OVERALL_TABLE.to_string(),
            metric_name: METRIC_OVERALL.to_string(),
            metric_value: overall,
            total_records: tables.iter().map(|t| t.scores.total_records).sum(),
            valid_records: tables.iter().map(|t| t.scores.complete_records).sum(),
            period_start: tables
                .iter()
                .map(|t| t.window_start)
                .min()
                .unwrap_or(now),
            period_end: now,
        });

        let system_health = self.system_health(now).await;
        let commit = self.store.commit_pass(&pass).await?;
        let issues_detected = tables.iter().map(|t| t.issues_detected).sum();

        tracing::info!(
            overall_score = overall,
            metrics = commit.metrics_written,
            issues_detected,
            issues_created = commit.issues_created,
            health = system_health.health_score,
            "Quality pass committed",
        );

        Ok(QualityCheckResult {
            overall_score: overall,
            status: status_from_score(overall),
            tables,
            system_health,
            issues_detected,
            issues_created: commit.issues_created,
            checked_at: now,
        })
    }

    /// Active stored rules for `table`, or the built-in defaults when none
    /// are configured. A malformed stored rule fails the pass.
    async fn rules_for(&self, table: MonitoredTable) -> Result<Vec<ColumnRule>, QualityError> {
        let stored = self.store.active_rules(table.name()).await?;
        if stored.is_empty() {
            return Ok(table.default_rules());
        }
        let rules = stored
            .iter()
            .map(QualityRule::to_column_rule)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    /// Reachability and freshness. Probe failures lower the score instead of
    /// failing the pass.
    async fn system_health(&self, now: Timestamp) -> SystemHealth {
        let database_reachable = match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Database health check failed");
                false
            }
        };
        let latest = match self
            .store
            .latest_ingested_at(MonitoredTable::EnergyConsumption)
            .await
        {
            Ok(latest) => latest,
            Err(e) => {
                tracing::warn!(error = %e, "Freshness check failed");
                None
            }
        };
        let data_freshness = freshness_score(latest, now);
        SystemHealth {
            database_reachable,
            data_freshness,
            health_score: system_health_score(database_reachable, data_freshness),
        }
    }

    // -- dashboard -----------------------------------------------------------

    pub async fn get_quality_dashboard_data(&self) -> Result<DashboardView, QualityError> {
        let now = chrono::Utc::now();

        let latest = self
            .store
            .latest_metrics(None, DASHBOARD_METRIC_LIMIT)
            .await?;
        let quality_scores = latest.iter().map(ScoreEntry::from).collect();

        let stored = self.store.latest_validation_results().await?;
        let validation_results = ALL_TABLES
            .iter()
            .map(|table| {
                stored
                    .iter()
                    .find(|r| r.table_name == table.name())
                    .map(|r| ValidationView {
                        table_name: r.table_name.clone(),
                        total_records: r.total_records,
                        passed: r.passed,
                        warnings: r.warnings,
                        errors: r.errors,
                        pass_rate: r.pass_rate,
                        issues_by_type: r.issues_by_type.clone(),
                        last_check: Some(r.checked_at),
                    })
                    .unwrap_or_else(|| ValidationView::unchecked(table.name()))
            })
            .collect();

        let recent_issues = self
            .store
            .list_issues(&IssueFilter {
                status: Some(IssueStatus::Open.as_str().to_string()),
                limit: Some(DASHBOARD_RECENT_ISSUES),
                ..Default::default()
            })
            .await?;

        let trends = self
            .store
            .list_trends(
                None,
                PeriodType::Daily.as_str(),
                now - Duration::days(DASHBOARD_TREND_DAYS),
            )
            .await?;

        Ok(DashboardView {
            quality_scores,
            validation_results,
            recent_issues,
            trends,
            last_updated: now,
        })
    }

    // -- issues --------------------------------------------------------------

    /// Resolve an `OPEN` issue.
    pub async fn resolve_issue(
        &self,
        id: DbId,
        resolution_notes: &str,
    ) -> Result<QualityIssue, QualityError> {
        let existing = self
            .store
            .find_issue(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "QualityIssue",
                id,
            })?;
        if existing.status != IssueStatus::Open.as_str() {
            return Err(already_closed(id, &existing.status));
        }

        match self.store.resolve_issue(id, resolution_notes).await? {
            Some(issue) => {
                tracing::info!(issue_id = id, "Quality issue resolved");
                Ok(issue)
            }
            // Closed by a concurrent caller between the read and the update.
            None => Err(already_closed(id, IssueStatus::Resolved.as_str())),
        }
    }

    pub async fn list_issues(&self, filter: IssueFilter) -> Result<Vec<QualityIssue>, QualityError> {
        let severity = filter
            .severity
            .as_deref()
            .map(IssueSeverity::parse)
            .transpose()?;
        let status = filter
            .status
            .as_deref()
            .map(IssueStatus::parse)
            .transpose()?;
        let filter = IssueFilter {
            severity: severity.map(|s| s.as_str().to_string()),
            status: status.map(|s| s.as_str().to_string()),
            ..filter
        };
        Ok(self.store.list_issues(&filter).await?)
    }

    /// Persist a single issue outside a pass (alerts).
    pub async fn create_issue(&self, dto: &CreateQualityIssue) -> Result<QualityIssue, QualityError> {
        Ok(self.store.create_issue(dto).await?)
    }

    // -- metrics and trends --------------------------------------------------

    pub async fn latest_metrics(
        &self,
        table_name: Option<&str>,
        limit: i64,
    ) -> Result<Vec<LatestMetric>, QualityError> {
        Ok(self.store.latest_metrics(table_name, limit).await?)
    }

    /// Roll up the most recently completed `period_type` period into one
    /// trend row per metric name. Rows that already exist are left alone,
    /// so only newly created rows are returned.
    pub async fn compute_trends(
        &self,
        period_type: PeriodType,
        now: Timestamp,
    ) -> Result<Vec<QualityTrend>, QualityError> {
        let (start, end) = period_type.last_completed(now);
        let (prev_start, prev_end) = period_type.preceding(start);

        let current = group_by_metric(self.store.metric_values_between(start, end).await?);
        let previous =
            group_by_metric(self.store.metric_values_between(prev_start, prev_end).await?);

        let mut created = Vec::new();
        for (metric_name, values) in &current {
            let previous_avg = previous.get(metric_name).and_then(|v| mean(v));
            let Some(summary) = summarize(values, previous_avg) else {
                continue;
            };
            let dto = CreateQualityTrend {
                metric_name: metric_name.clone(),
                period_type: period_type.as_str().to_string(),
                period_start: start,
                period_end: end,
                avg_score: summary.avg_score,
                min_score: summary.min_score,
                max_score: summary.max_score,
                trend_direction: summary.direction.as_str().to_string(),
                trend_percentage: summary.percentage,
            };
            if let Some(row) = self.store.create_trend_if_absent(&dto).await? {
                created.push(row);
            }
        }

        if !created.is_empty() {
            tracing::info!(
                period_type = period_type.as_str(),
                period_start = %start,
                count = created.len(),
                "Quality trends computed",
            );
        }
        Ok(created)
    }

    pub async fn list_trends(
        &self,
        metric_name: Option<&str>,
        period_type: &str,
        days_back: i64,
    ) -> Result<Vec<QualityTrend>, QualityError> {
        let period_type = PeriodType::parse(period_type)?;
        let since = chrono::Utc::now() - Duration::days(days_back);
        Ok(self
            .store
            .list_trends(metric_name, period_type.as_str(), since)
            .await?)
    }

    // -- summary -------------------------------------------------------------

    /// Evaluate every table over the last `days_back` days without
    /// persisting anything.
    pub async fn quality_summary(&self, days_back: i64) -> Result<QualitySummary, QualityError> {
        let now = chrono::Utc::now();
        let since = now - Duration::days(days_back);

        let mut tables = Vec::with_capacity(ALL_TABLES.len());
        for &table in ALL_TABLES {
            let rules = self.rules_for(table).await?;
            let calculator = MetricCalculator::new(table, &rules)?;
            let records = self.store.load_population(table, since).await?;
            tables.push(calculator.evaluate(&records));
        }

        let mut open_issues_by_severity = BTreeMap::new();
        for count in self.store.issue_counts().await? {
            if count.status == IssueStatus::Open.as_str() {
                *open_issues_by_severity.entry(count.severity).or_insert(0) += count.count;
            }
        }

        Ok(QualitySummary {
            days_back,
            tables,
            open_issues: open_issues_by_severity.values().sum(),
            open_issues_by_severity,
            last_updated: now,
        })
    }

    // -- rules ---------------------------------------------------------------

    pub async fn list_rules(&self, table_name: Option<&str>) -> Result<Vec<QualityRule>, QualityError> {
        if let Some(name) = table_name {
            MonitoredTable::from_name(name)?;
        }
        Ok(self.store.list_rules(table_name).await?)
    }

    /// Create a rule after checking it parses and fits the table schema.
    pub async fn create_rule(&self, dto: CreateQualityRule) -> Result<QualityRule, QualityError> {
        let table = MonitoredTable::from_name(&dto.table_name)?;
        let rule =
            ColumnRule::from_config(&dto.column_name, &dto.rule_type, dto.rule_config.as_ref())?;
        rule.validate_for(table)?;
        rule.compile()?;

        let dto = CreateQualityRule {
            rule_config: rule.config_json(),
            ..dto
        };
        let created = self.store.create_rule(&dto).await?;
        tracing::info!(
            rule_id = created.id,
            table = %created.table_name,
            column = %created.column_name,
            rule_type = %created.rule_type,
            "Quality rule created",
        );
        Ok(created)
    }

    pub async fn set_rule_active(&self, id: DbId, is_active: bool) -> Result<QualityRule, QualityError> {
        let rule = self
            .store
            .set_rule_active(id, is_active)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "QualityRule",
                id,
            })?;
        tracing::info!(rule_id = id, is_active, "Quality rule toggled");
        Ok(rule)
    }
}

fn already_closed(id: DbId, status: &str) -> QualityError {
    CoreError::Conflict(format!("Quality issue {id} is already {status}")).into()
}

fn group_by_metric(samples: Vec<MetricSample>) -> BTreeMap<String, Vec<f64>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for sample in samples {
        groups
            .entry(sample.metric_name)
            .or_default()
            .push(sample.metric_value);
    }
    groups
}
