//! Query parameter types for the quality endpoints.

use serde::Deserialize;

pub const DEFAULT_METRICS_LIMIT: i64 = 50;
pub const MAX_METRICS_LIMIT: i64 = 200;
pub const DEFAULT_ISSUES_LIMIT: i64 = 100;
pub const MAX_ISSUES_LIMIT: i64 = 500;
pub const DEFAULT_DAYS_BACK: i64 = 30;
pub const MAX_DAYS_BACK: i64 = 365;

/// `?table_name=&limit=`
#[derive(Debug, Default, Deserialize)]
pub struct MetricsParams {
    pub table_name: Option<String>,
    pub limit: Option<i64>,
}

/// `?table_name=&severity=&status=&limit=`
#[derive(Debug, Default, Deserialize)]
pub struct IssuesParams {
    pub table_name: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

/// `?metric_name=&period_type=&days_back=`
#[derive(Debug, Default, Deserialize)]
pub struct TrendsParams {
    pub metric_name: Option<String>,
    pub period_type: Option<String>,
    pub days_back: Option<i64>,
}

/// `?days_back=`
#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
    pub days_back: Option<i64>,
}

/// `?table_name=`
#[derive(Debug, Default, Deserialize)]
pub struct RulesParams {
    pub table_name: Option<String>,
}

/// Clamp an optional limit into `1..=max`, defaulting to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}
