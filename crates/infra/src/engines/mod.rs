//! Order engines: couple the pure order aggregates to ledger movements.
//!
//! Every engine operation follows the same pipeline:
//!
//! ```text
//! lock order (bounded wait)
//!   -> handle command (pure, may reject)
//!   -> apply ledger batch (all-or-nothing, may reject)
//!   -> apply events to the aggregate
//!   -> publish events on the change feed
//! ```
//!
//! A rejection at any step leaves both the order and the ledger untouched.

pub mod inbound;
pub mod outbound;

use std::fmt::Display;

use serde::Serialize;

use stockyard_core::{Aggregate, WarehouseId};
use stockyard_events::Event;

use crate::feed::ChangeFeed;

pub use inbound::{ConfirmOutcome, InboundEngine};
pub use outbound::{OutboundEngine, ShipResult};

/// Apply already-validated events and publish them.
pub(crate) fn commit<A>(
    order: &mut A,
    events: &[A::Event],
    feed: &ChangeFeed,
    warehouse_id: WarehouseId,
    aggregate_type: &str,
) where
    A: Aggregate,
    A::Id: Display,
    A::Event: Event + Serialize,
{
    for event in events {
        order.apply(event);
        feed.publish(warehouse_id, aggregate_type, order.id(), order.version(), event);
    }
}
