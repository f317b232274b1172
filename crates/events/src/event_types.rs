//! Event names published by the quality engine.

/// Prefix shared by every quality event.
pub const QUALITY_PREFIX: &str = "quality.";

/// A quality pass finished and its results were committed.
pub const QUALITY_CHECK_COMPLETED: &str = "quality.check_completed";

/// A quality pass failed; nothing was committed.
pub const QUALITY_CHECK_FAILED: &str = "quality.check_failed";

/// A threshold alert was recorded as a quality issue.
pub const QUALITY_ALERT_RAISED: &str = "quality.alert_raised";

/// An issue was resolved through the API.
pub const QUALITY_ISSUE_RESOLVED: &str = "quality.issue_resolved";

/// Monitoring was started or stopped.
pub const QUALITY_MONITOR_STATE_CHANGED: &str = "quality.monitor_state_changed";

pub fn is_quality_event(event_type: &str) -> bool {
    event_type.starts_with(QUALITY_PREFIX)
}
