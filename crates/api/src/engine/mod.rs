//! Quality engine: the store seam and the service that runs passes over it.

pub mod quality_service;
pub mod store;

#[cfg(test)]
pub mod memory_store;

use gridwatch_core::error::CoreError;

pub use quality_service::QualityService;
pub use store::{PgQualityStore, QualityStore};

/// Failure of a quality operation.
///
/// Domain errors (unknown table, malformed rule, missing issue) are never
/// retried. Store errors are transient from the monitor's point of view.
#[derive(Debug, thiserror::Error)]
pub enum QualityError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),
}
