//! Handlers for the quality read models, issue resolution and rules.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use gridwatch_core::error::CoreError;
use gridwatch_core::trends::PeriodType;
use gridwatch_core::types::{DbId, Timestamp};
use gridwatch_db::models::quality_issue::{IssueFilter, QualityIssue};
use gridwatch_db::models::quality_metric::LatestMetric;
use gridwatch_db::models::quality_rule::{CreateQualityRule, QualityRule, UpdateQualityRule};
use gridwatch_db::models::quality_trend::QualityTrend;
use gridwatch_events::event_types::QUALITY_ISSUE_RESOLVED;
use gridwatch_events::DomainEvent;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::background::quality_monitor::ImmediateCheckOutcome;
use crate::engine::quality_service::{DashboardView, QualitySummary};
use crate::error::{AppError, AppResult};
use crate::query::{
    clamp_limit, IssuesParams, MetricsParams, RulesParams, SummaryParams, TrendsParams,
    DEFAULT_DAYS_BACK, DEFAULT_ISSUES_LIMIT, DEFAULT_METRICS_LIMIT, MAX_DAYS_BACK,
    MAX_ISSUES_LIMIT, MAX_METRICS_LIMIT,
};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ResolveIssueRequest {
    pub resolution_notes: String,
}

/// Acknowledgement for a check that runs after the response is sent.
#[derive(Debug, Serialize)]
pub struct CheckAccepted {
    pub status: &'static str,
    pub requested_at: Timestamp,
}

fn days_back(value: Option<i64>) -> AppResult<i64> {
    let days = value.unwrap_or(DEFAULT_DAYS_BACK);
    if !(1..=MAX_DAYS_BACK).contains(&days) {
        return Err(AppError::BadRequest(format!(
            "days_back must be between 1 and {MAX_DAYS_BACK}"
        )));
    }
    Ok(days)
}

// ---------------------------------------------------------------------------
// Dashboard and checks
// ---------------------------------------------------------------------------

/// GET /quality/dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DashboardView>>> {
    let view = state.quality.get_quality_dashboard_data().await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /quality/run-check
///
/// Starts a full pass in the background and returns 202 immediately. The
/// outcome is published on the push channel.
pub async fn run_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<DataResponse<CheckAccepted>>) {
    let monitor = state.monitor.clone();
    tokio::spawn(async move {
        match monitor.run_immediate_check().await {
            ImmediateCheckOutcome::Completed { overall_score, .. } => {
                tracing::info!(overall_score, "Requested quality check finished");
            }
            ImmediateCheckOutcome::Failed { error, .. } => {
                tracing::error!(error = %error, "Requested quality check failed");
            }
        }
    });

    (
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: CheckAccepted {
                status: "accepted",
                requested_at: Utc::now(),
            },
        }),
    )
}

/// GET /quality/summary
pub async fn get_summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> AppResult<Json<DataResponse<QualitySummary>>> {
    let summary = state
        .quality
        .quality_summary(days_back(params.days_back)?)
        .await?;
    Ok(Json(DataResponse { data: summary }))
}

// ---------------------------------------------------------------------------
// Metrics and trends
// ---------------------------------------------------------------------------

/// GET /quality/metrics
pub async fn list_metrics(
    State(state): State<AppState>,
    Query(params): Query<MetricsParams>,
) -> AppResult<Json<DataResponse<Vec<LatestMetric>>>> {
    let limit = clamp_limit(params.limit, DEFAULT_METRICS_LIMIT, MAX_METRICS_LIMIT);
    let metrics = state
        .quality
        .latest_metrics(params.table_name.as_deref(), limit)
        .await?;
    Ok(Json(DataResponse { data: metrics }))
}

/// GET /quality/trends
pub async fn list_trends(
    State(state): State<AppState>,
    Query(params): Query<TrendsParams>,
) -> AppResult<Json<DataResponse<Vec<QualityTrend>>>> {
    let period_type = params
        .period_type
        .as_deref()
        .unwrap_or(PeriodType::Daily.as_str());
    let trends = state
        .quality
        .list_trends(
            params.metric_name.as_deref(),
            period_type,
            days_back(params.days_back)?,
        )
        .await?;
    Ok(Json(DataResponse { data: trends }))
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// GET /quality/issues
pub async fn list_issues(
    State(state): State<AppState>,
    Query(params): Query<IssuesParams>,
) -> AppResult<Json<DataResponse<Vec<QualityIssue>>>> {
    let filter = IssueFilter {
        table_name: params.table_name,
        severity: params.severity,
        status: params.status,
        limit: Some(clamp_limit(
            params.limit,
            DEFAULT_ISSUES_LIMIT,
            MAX_ISSUES_LIMIT,
        )),
    };
    let issues = state.quality.list_issues(filter).await?;
    Ok(Json(DataResponse { data: issues }))
}

/// PUT /quality/issues/{id}/resolve
pub async fn resolve_issue(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ResolveIssueRequest>,
) -> AppResult<Json<DataResponse<QualityIssue>>> {
    let notes = input.resolution_notes.trim();
    if notes.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "resolution_notes is required".to_string(),
        )));
    }

    let issue = state.quality.resolve_issue(id, notes).await?;
    state.event_bus.publish(
        DomainEvent::new(QUALITY_ISSUE_RESOLVED)
            .with_table(issue.table_name.clone())
            .with_payload(json!({ "issue_id": issue.id, "resolved_at": issue.resolved_at })),
    );
    Ok(Json(DataResponse { data: issue }))
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// GET /quality/rules
pub async fn list_rules(
    State(state): State<AppState>,
    Query(params): Query<RulesParams>,
) -> AppResult<Json<DataResponse<Vec<QualityRule>>>> {
    let rules = state
        .quality
        .list_rules(params.table_name.as_deref())
        .await?;
    Ok(Json(DataResponse { data: rules }))
}

/// POST /quality/rules
pub async fn create_rule(
    State(state): State<AppState>,
    Json(input): Json<CreateQualityRule>,
) -> AppResult<(StatusCode, Json<DataResponse<QualityRule>>)> {
    let rule = state.quality.create_rule(input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: rule })))
}

/// PATCH /quality/rules/{id}
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateQualityRule>,
) -> AppResult<Json<DataResponse<QualityRule>>> {
    let rule = state.quality.set_rule_active(id, input.is_active).await?;
    Ok(Json(DataResponse { data: rule }))
}
