//! Score arithmetic shared by the quality service and dashboard.
//!
//! All scores are percentages in `[0, 100]` rounded to two decimals.

use serde::Serialize;

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Status bands
// ---------------------------------------------------------------------------

pub const THRESHOLD_EXCELLENT: f64 = 95.0;
pub const THRESHOLD_GOOD: f64 = 85.0;
pub const THRESHOLD_WARNING: f64 = 70.0;
pub const THRESHOLD_POOR: f64 = 0.0;

/// Human-facing classification of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusBand {
    Excellent,
    Good,
    Warning,
    Poor,
}

impl StatusBand {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Poor => "poor",
        }
    }
}

/// Classify a score into its status band.
///
/// - `>= 95` excellent
/// - `>= 85` good
/// - `>= 70` warning
/// - otherwise poor
pub fn status_from_score(score: f64) -> StatusBand {
    if score >= THRESHOLD_EXCELLENT {
        StatusBand::Excellent
    } else if score >= THRESHOLD_GOOD {
        StatusBand::Good
    } else if score >= THRESHOLD_WARNING {
        StatusBand::Warning
    } else {
        StatusBand::Poor
    }
}

// ---------------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------------

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / total` as a percentage. An empty population scores 0.0.
pub fn percentage(part: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    round2(part as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// Unweighted arithmetic mean of the given scores. No scores -> 0.0.
pub fn overall_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    round2(scores.iter().sum::<f64>() / scores.len() as f64)
}

// ---------------------------------------------------------------------------
// System health
// ---------------------------------------------------------------------------

/// Freshness points lost per hour since the newest ingested record.
pub const FRESHNESS_DECAY_PER_HOUR: f64 = 2.0;

/// Data freshness: 100 minus 2 points per hour since `latest`, floored at 0.
///
/// No ingested record at all scores 0.
pub fn freshness_score(latest: Option<Timestamp>, now: Timestamp) -> f64 {
    let Some(latest) = latest else {
        return 0.0;
    };
    let hours = (now - latest).num_seconds().max(0) as f64 / 3600.0;
    round2((100.0 - hours * FRESHNESS_DECAY_PER_HOUR).max(0.0))
}

/// Combine database reachability and freshness into one health score.
pub fn system_health_score(db_reachable: bool, freshness: f64) -> f64 {
    let db = if db_reachable { 100.0 } else { 0.0 };
    round2((db + freshness) / 2.0)
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

/// `"energy_consumption"` + `"completeness"` -> `"Energy Consumption Completeness"`.
pub fn score_label(table_name: &str, metric_name: &str) -> String {
    format!("{} {}", title_case(table_name), title_case(metric_name))
}

fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Signed change of `current` relative to `previous`, e.g. `"+2.1%"`.
pub fn format_change(current: f64, previous: Option<f64>) -> String {
    let delta = match previous {
        Some(prev) if prev.abs() > f64::EPSILON => (current - prev) / prev * 100.0,
        _ => 0.0,
    };
    let delta = round1(delta);
    if delta < 0.0 {
        format!("{delta:.1}%")
    } else {
        format!("+{:.1}%", delta.abs())
    }
}
