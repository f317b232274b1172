//! Atomic persistence of one quality pass.

use sqlx::PgPool;

use crate::models::quality_issue::CreateQualityIssue;
use crate::models::quality_metric::CreateQualityMetric;
use crate::models::validation_result::CreateValidationResult;
use crate::repositories::{QualityIssueRepo, QualityMetricRepo, ValidationResultRepo};

/// Everything one pass writes.
#[derive(Debug, Clone, Default)]
pub struct PassWrite {
    pub metrics: Vec<CreateQualityMetric>,
    pub validation_results: Vec<CreateValidationResult>,
    /// Record-level issues; de-duplicated against open issues on insert.
    pub issues: Vec<CreateQualityIssue>,
}

/// What a committed pass actually inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassCommit {
    pub metrics_written: usize,
    pub validation_results_written: usize,
    pub issues_created: usize,
}

pub struct QualityPassRepo;

impl QualityPassRepo {
    /// Write a whole pass in one transaction. Any failure rolls back all of it.
    pub async fn commit(pool: &PgPool, pass: &PassWrite) -> Result<PassCommit, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut commit = PassCommit::default();

        for metric in &pass.metrics {
            QualityMetricRepo::create_in(&mut *tx, metric).await?;
            commit.metrics_written += 1;
        }
        for result in &pass.validation_results {
            ValidationResultRepo::create_in(&mut *tx, result).await?;
            commit.validation_results_written += 1;
        }
        for issue in &pass.issues {
            if QualityIssueRepo::create_if_absent_in(&mut *tx, issue)
                .await?
                .is_some()
            {
                commit.issues_created += 1;
            }
        }

        tx.commit().await?;
        Ok(commit)
    }
}
