//! Domain events and their in-process fan-out.
//!
//! Order engines and the ledger describe every committed change as an event.
//! Events are wrapped in an [`EventEnvelope`] and published on an [`EventBus`];
//! the API forwards them to SSE subscribers (push-on-write freshness).

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
