//! Push-on-write change feed.
//!
//! Engines and the ledger publish every committed event here after the
//! mutation is visible. Publication is best-effort: a failure is logged and
//! never rolls back or fails the operation that produced the event.

use std::fmt::Display;
use std::sync::Arc;

use serde::Serialize;

use stockyard_core::WarehouseId;
use stockyard_events::{Event, EventBus, EventEnvelope, InMemoryEventBus, Subscription};

pub type ChangeEnvelope = EventEnvelope<serde_json::Value>;

#[derive(Debug, Clone, Default)]
pub struct ChangeFeed {
    bus: Arc<InMemoryEventBus<ChangeEnvelope>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription<ChangeEnvelope> {
        self.bus.subscribe()
    }

    pub fn publish<E>(
        &self,
        warehouse_id: WarehouseId,
        aggregate_type: &str,
        aggregate_id: impl Display,
        sequence_number: u64,
        event: &E,
    ) where
        E: Event + Serialize,
    {
        let envelope = match EventEnvelope::from_event(
            warehouse_id,
            aggregate_type,
            aggregate_id.to_string(),
            sequence_number,
            event,
        ) {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(event_type = event.event_type(), error = %err, "failed to encode change event");
                return;
            }
        };
        if let Err(err) = self.bus.publish(envelope) {
            tracing::warn!(event_type = event.event_type(), error = ?err, "failed to publish change event");
        }
    }
}
