//! Gridwatch in-process event bus.
//!
//! - [`EventBus`]: publish/subscribe hub backed by `tokio::sync::broadcast`.
//! - [`DomainEvent`]: the event envelope carried on the bus.
//! - [`event_types`]: names of the events the quality engine publishes.

pub mod bus;
pub mod event_types;

pub use bus::{DomainEvent, EventBus};
