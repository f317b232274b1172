//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>`. Subscribers that fall behind
//! observe `RecvError::Lagged` and skip ahead; nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::event_types::is_quality_event;

// ---------------------------------------------------------------------------
// DomainEvent
// ---------------------------------------------------------------------------

/// Something that happened inside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Dot-separated event name, e.g. `"quality.check_completed"`.
    pub event_type: String,

    /// Monitored table the event concerns, if it concerns only one.
    pub table_name: Option<String>,

    /// Event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl DomainEvent {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            table_name: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_table(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = Some(table_name.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn is_quality(&self) -> bool {
        is_quality_event(&self.event_type)
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

/// In-process fan-out event bus.
///
/// ```rust
/// use gridwatch_events::bus::{DomainEvent, EventBus};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(DomainEvent::new("quality.check_completed"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that will see it. With no
    /// subscribers the event is dropped.
    pub fn publish(&self, event: DomainEvent) -> usize {
        tracing::debug!(event_type = %event.event_type, "Publishing event");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_types::{QUALITY_CHECK_COMPLETED, QUALITY_CHECK_FAILED};

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        let delivered = bus.publish(
            DomainEvent::new(QUALITY_CHECK_COMPLETED)
                .with_table("energy_consumption")
                .with_payload(serde_json::json!({ "overall_score": 91.5 })),
        );
        assert_eq!(delivered, 1);

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.event_type, QUALITY_CHECK_COMPLETED);
        assert_eq!(received.table_name.as_deref(), Some("energy_consumption"));
        assert_eq!(received.payload["overall_score"], 91.5);
        assert!(received.is_quality());
    }

    #[tokio::test]
    async fn every_subscriber_sees_each_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(DomainEvent::new(QUALITY_CHECK_FAILED));

        assert_eq!(rx1.recv().await.unwrap().event_type, QUALITY_CHECK_FAILED);
        assert_eq!(rx2.recv().await.unwrap().event_type, QUALITY_CHECK_FAILED);
    }

    #[test]
    fn publish_without_subscribers_is_dropped() {
        let bus = EventBus::default();
        assert_eq!(bus.publish(DomainEvent::new("quality.orphan")), 0);
    }

    #[tokio::test]
    async fn slow_subscriber_observes_lag() {
        let bus = EventBus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..5 {
            bus.publish(DomainEvent::new(QUALITY_CHECK_COMPLETED));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
    }

    #[test]
    fn non_quality_events_are_recognized() {
        assert!(!DomainEvent::new("system.started").is_quality());
    }
}
