//! Gridwatch domain logic.
//!
//! Everything in this crate is pure: record populations go in, scores,
//! issue drafts and trend summaries come out. Persistence lives in
//! `gridwatch_db`, orchestration in `gridwatch_api::engine`.

pub mod alerting;
pub mod error;
pub mod issue_detection;
pub mod metrics;
pub mod monitored;
pub mod quality_status;
pub mod rules;
pub mod scoring;
pub mod trends;
pub mod types;
