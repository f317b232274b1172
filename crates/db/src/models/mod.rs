//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts

pub mod monitored;
pub mod quality_issue;
pub mod quality_metric;
pub mod quality_rule;
pub mod quality_trend;
pub mod validation_result;
