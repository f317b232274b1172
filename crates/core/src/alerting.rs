//! Threshold alerts evaluated after each quality pass.

use crate::issue_detection::IssueDraft;
use crate::quality_status::IssueSeverity;

/// Logical table name for system-level alerts.
pub const SYSTEM_MONITORING_TABLE: &str = "system_monitoring";
pub const ISSUE_QUALITY_DEGRADATION: &str = "quality_degradation";

pub const DEFAULT_ALERT_THRESHOLD: f64 = 70.0;
pub const COMPLETENESS_ALERT_FLOOR: f64 = 80.0;
pub const ACCURACY_ALERT_FLOOR: f64 = 85.0;

/// Per-table scores an alert decision depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableAlertInput<'a> {
    pub table_name: &'a str,
    pub completeness: f64,
    pub accuracy: f64,
}

/// Decide which alerts a finished pass should raise.
///
/// - overall below `threshold` raises one HIGH system-level issue
/// - each table below the completeness or accuracy floor raises one MEDIUM
///   issue per failing dimension
pub fn evaluate_alerts(
    overall_score: f64,
    threshold: f64,
    tables: &[TableAlertInput<'_>],
) -> Vec<IssueDraft> {
    let mut alerts = Vec::new();

    if overall_score < threshold {
        alerts.push(IssueDraft {
            table_name: SYSTEM_MONITORING_TABLE.to_string(),
            record_id: None,
            issue_type: ISSUE_QUALITY_DEGRADATION.to_string(),
            description: format!(
                "Overall data quality score dropped to {overall_score}% (threshold {threshold}%)"
            ),
            severity: IssueSeverity::High,
        });
    }

    for t in tables {
        if t.completeness < COMPLETENESS_ALERT_FLOOR {
            alerts.push(table_alert(t.table_name, "completeness", t.completeness));
        }
        if t.accuracy < ACCURACY_ALERT_FLOOR {
            alerts.push(table_alert(t.table_name, "accuracy", t.accuracy));
        }
    }

    alerts
}

fn table_alert(table_name: &str, dimension: &str, score: f64) -> IssueDraft {
    IssueDraft {
        table_name: table_name.to_string(),
        record_id: None,
        issue_type: ISSUE_QUALITY_DEGRADATION.to_string(),
        description: format!("{table_name} {dimension} dropped to {score}%"),
        severity: IssueSeverity::Medium,
    }
}
