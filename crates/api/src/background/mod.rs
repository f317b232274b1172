//! Background tasks.
//!
//! The quality monitor owns its own scheduling task and is started and
//! stopped through its API. Every task observes a [`CancellationToken`]
//! for graceful shutdown.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

pub mod quality_monitor;
