//! Trend roll-ups over metric history.
//!
//! A trend row summarizes every value recorded for one metric name within a
//! calendar period (UTC) and compares its average with the preceding period.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::scoring::round2;
use crate::types::Timestamp;

/// Average changes smaller than this (in percent) count as stable.
pub const STABLE_BAND_PERCENT: f64 = 1.0;

// ---------------------------------------------------------------------------
// Periods
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodType {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl PeriodType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.to_ascii_uppercase().as_str() {
            "HOURLY" => Ok(Self::Hourly),
            "DAILY" => Ok(Self::Daily),
            "WEEKLY" => Ok(Self::Weekly),
            "MONTHLY" => Ok(Self::Monthly),
            _ => Err(CoreError::Validation(format!(
                "Unknown period type: '{value}'. Valid values: HOURLY, DAILY, WEEKLY, MONTHLY"
            ))),
        }
    }

    /// Start of the period containing `t`.
    pub fn period_start(self, t: Timestamp) -> Timestamp {
        let date = t.date_naive();
        match self {
            Self::Hourly => midnight(date) + Duration::hours(i64::from(t.hour())),
            Self::Daily => midnight(date),
            Self::Weekly => {
                midnight(date) - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            Self::Monthly => midnight(date.with_day(1).unwrap_or(date)),
        }
    }

    /// End (exclusive) of the period starting at `start`.
    pub fn period_end(self, start: Timestamp) -> Timestamp {
        match self {
            Self::Hourly => start + Duration::hours(1),
            Self::Daily => start + Duration::days(1),
            Self::Weekly => start + Duration::weeks(1),
            Self::Monthly => {
                let date = start.date_naive();
                let (year, month) = if date.month() == 12 {
                    (date.year() + 1, 1)
                } else {
                    (date.year(), date.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1)
                    .map(midnight)
                    .unwrap_or(start + Duration::days(31))
            }
        }
    }

    /// `[start, end)` of the period containing `t`.
    pub fn bounds(self, t: Timestamp) -> (Timestamp, Timestamp) {
        let start = self.period_start(t);
        (start, self.period_end(start))
    }

    /// The most recent period that ended at or before `now`.
    pub fn last_completed(self, now: Timestamp) -> (Timestamp, Timestamp) {
        self.preceding(self.period_start(now))
    }

    /// The period immediately before the one starting at `start`.
    pub fn preceding(self, start: Timestamp) -> (Timestamp, Timestamp) {
        self.bounds(start - Duration::seconds(1))
    }
}

fn midnight(date: NaiveDate) -> Timestamp {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

impl TrendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Improving => "IMPROVING",
            Self::Declining => "DECLINING",
            Self::Stable => "STABLE",
        }
    }

    fn from_change(change: f64) -> Self {
        if change.abs() < STABLE_BAND_PERCENT {
            Self::Stable
        } else if change > 0.0 {
            Self::Improving
        } else {
            Self::Declining
        }
    }
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// Aggregate of one metric over one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub avg_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub direction: TrendDirection,
    /// `None` when there is no previous period to compare against.
    pub percentage: Option<f64>,
}

/// Summarize `values` and compare their average with `previous_avg`.
///
/// Returns `None` for an empty period. A previous average of zero cannot be
/// compared against and is treated like a missing one.
pub fn summarize(values: &[f64], previous_avg: Option<f64>) -> Option<TrendSummary> {
    if values.is_empty() {
        return None;
    }
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let percentage = previous_avg
        .filter(|prev| prev.abs() > f64::EPSILON)
        .map(|prev| round2((avg - prev) / prev * 100.0));
    let direction = percentage
        .map(TrendDirection::from_change)
        .unwrap_or(TrendDirection::Stable);

    Some(TrendSummary {
        avg_score: round2(avg),
        min_score: round2(min),
        max_score: round2(max),
        direction,
        percentage,
    })
}

/// Plain average, used for the previous-period comparison.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn daily_last_completed_is_yesterday() {
        let (start, end) = PeriodType::Daily.last_completed(at(2024, 3, 10, 14, 30));
        assert_eq!(start, at(2024, 3, 9, 0, 0));
        assert_eq!(end, at(2024, 3, 10, 0, 0));
    }

    #[test]
    fn hourly_period_truncates_minutes() {
        let (start, end) = PeriodType::Hourly.bounds(at(2024, 3, 10, 14, 30));
        assert_eq!(start, at(2024, 3, 10, 14, 0));
        assert_eq!(end, at(2024, 3, 10, 15, 0));
    }

    #[test]
    fn weekly_period_starts_on_monday() {
        // 2024-03-10 is a Sunday.
        let (start, end) = PeriodType::Weekly.bounds(at(2024, 3, 10, 9, 0));
        assert_eq!(start, at(2024, 3, 4, 0, 0));
        assert_eq!(end, at(2024, 3, 11, 0, 0));
    }

    #[test]
    fn monthly_period_rolls_over_year_end() {
        let (start, end) = PeriodType::Monthly.bounds(at(2023, 12, 15, 0, 0));
        assert_eq!(start, at(2023, 12, 1, 0, 0));
        assert_eq!(end, at(2024, 1, 1, 0, 0));
        let (prev_start, prev_end) = PeriodType::Monthly.preceding(start);
        assert_eq!(prev_start, at(2023, 11, 1, 0, 0));
        assert_eq!(prev_end, start);
    }

    #[test]
    fn period_type_parses_case_insensitively() {
        assert_eq!(PeriodType::parse("daily").unwrap(), PeriodType::Daily);
        assert!(PeriodType::parse("yearly").is_err());
    }

    #[test]
    fn summary_without_previous_is_stable() {
        let s = summarize(&[80.0, 90.0, 100.0], None).unwrap();
        assert_eq!(s.avg_score, 90.0);
        assert_eq!(s.min_score, 80.0);
        assert_eq!(s.max_score, 100.0);
        assert_eq!(s.direction, TrendDirection::Stable);
        assert_eq!(s.percentage, None);
    }

    #[test]
    fn small_change_is_stable() {
        let s = summarize(&[90.5], Some(90.0)).unwrap();
        assert_eq!(s.percentage, Some(0.56));
        assert_eq!(s.direction, TrendDirection::Stable);
    }

    #[test]
    fn direction_follows_sign_of_change() {
        let up = summarize(&[99.0], Some(90.0)).unwrap();
        assert_eq!(up.percentage, Some(10.0));
        assert_eq!(up.direction, TrendDirection::Improving);

        let down = summarize(&[81.0], Some(90.0)).unwrap();
        assert_eq!(down.percentage, Some(-10.0));
        assert_eq!(down.direction, TrendDirection::Declining);
    }

    #[test]
    fn empty_period_has_no_summary() {
        assert!(summarize(&[], Some(50.0)).is_none());
        assert_eq!(mean(&[]), None);
    }
}
