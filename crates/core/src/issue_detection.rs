//! Record-level defect scanning.
//!
//! Only the energy population is scanned. Each category is capped at
//! [`MAX_ISSUES_PER_CATEGORY`] matches, taken in population order.

use serde::Serialize;

use crate::monitored::{
    FieldValue, MonitoredRecord, MonitoredTable, COL_CONSUMPTION_MWH, COL_REGION, COL_TIMESTAMP,
};
use crate::quality_status::IssueSeverity;
use crate::types::DbId;

pub const ISSUE_NULL_CONSUMPTION: &str = "null_consumption";
pub const ISSUE_NEGATIVE_CONSUMPTION: &str = "negative_consumption";
pub const ISSUE_POTENTIAL_OUTLIER: &str = "potential_outlier";

pub const MAX_ISSUES_PER_CATEGORY: usize = 10;

/// Consumption above this many MWh is flagged as a potential outlier.
pub const OUTLIER_CONSUMPTION_MWH: f64 = 100_000.0;

/// A quality issue ready to be persisted as `OPEN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueDraft {
    pub table_name: String,
    /// `None` for system-level and table-level issues.
    pub record_id: Option<DbId>,
    pub issue_type: String,
    pub description: String,
    pub severity: IssueSeverity,
}

/// Scan a population for defects.
pub fn detect_issues(table: MonitoredTable, records: &[MonitoredRecord]) -> Vec<IssueDraft> {
    match table {
        MonitoredTable::EnergyConsumption => detect_energy_issues(records),
        MonitoredTable::WeatherData => Vec::new(),
    }
}

fn detect_energy_issues(records: &[MonitoredRecord]) -> Vec<IssueDraft> {
    let table = MonitoredTable::EnergyConsumption.name();
    let draft = |record: &MonitoredRecord, issue_type: &str, severity, description| IssueDraft {
        table_name: table.to_string(),
        record_id: Some(record.id),
        issue_type: issue_type.to_string(),
        description,
        severity,
    };

    let nulls = records
        .iter()
        .filter(|r| r.is_null(COL_CONSUMPTION_MWH))
        .take(MAX_ISSUES_PER_CATEGORY)
        .map(|r| {
            draft(
                r,
                ISSUE_NULL_CONSUMPTION,
                IssueSeverity::High,
                format!(
                    "Null consumption value for {} at {}",
                    region(r),
                    display(r.get(COL_TIMESTAMP))
                ),
            )
        });

    let negatives = records
        .iter()
        .filter_map(|r| r.number(COL_CONSUMPTION_MWH).map(|v| (r, v)))
        .filter(|(_, v)| *v < 0.0)
        .take(MAX_ISSUES_PER_CATEGORY)
        .map(|(r, v)| {
            draft(
                r,
                ISSUE_NEGATIVE_CONSUMPTION,
                IssueSeverity::Medium,
                format!("Negative consumption value: {v} for {}", region(r)),
            )
        });

    let outliers = records
        .iter()
        .filter_map(|r| r.number(COL_CONSUMPTION_MWH).map(|v| (r, v)))
        .filter(|(_, v)| *v > OUTLIER_CONSUMPTION_MWH)
        .take(MAX_ISSUES_PER_CATEGORY)
        .map(|(r, v)| {
            draft(
                r,
                ISSUE_POTENTIAL_OUTLIER,
                IssueSeverity::Low,
                format!("Unusually high consumption: {v} MWh for {}", region(r)),
            )
        });

    nulls.chain(negatives).chain(outliers).collect()
}

fn region(record: &MonitoredRecord) -> &str {
    record.text(COL_REGION).unwrap_or("unknown region")
}

fn display(value: Option<&FieldValue>) -> String {
    match value {
        Some(FieldValue::Time(t)) => t.to_rfc3339(),
        Some(FieldValue::Text(s)) => s.clone(),
        Some(FieldValue::Number(n)) => n.to_string(),
        None => "unknown time".to_string(),
    }
}
