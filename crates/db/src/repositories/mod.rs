//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument. Inserts that must share a
//! transaction also have an `_in` variant taking `&mut PgConnection`.

pub mod monitored_table_repo;
pub mod quality_issue_repo;
pub mod quality_metric_repo;
pub mod quality_pass_repo;
pub mod quality_rule_repo;
pub mod quality_trend_repo;
pub mod validation_result_repo;

pub use monitored_table_repo::MonitoredTableRepo;
pub use quality_issue_repo::QualityIssueRepo;
pub use quality_metric_repo::QualityMetricRepo;
pub use quality_pass_repo::{PassCommit, PassWrite, QualityPassRepo};
pub use quality_rule_repo::QualityRuleRepo;
pub use quality_trend_repo::QualityTrendRepo;
pub use validation_result_repo::ValidationResultRepo;
