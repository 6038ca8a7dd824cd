//! Infrastructure layer: locking, the inventory ledger, order engines,
//! reporting and the change feed. Everything is in-process and in-memory.

pub mod engines;
pub mod feed;
pub mod ledger;
pub mod locks;
pub mod reporting;
pub mod seed;
pub mod services;

pub use engines::{ConfirmOutcome, InboundEngine, OutboundEngine, ShipResult};
pub use feed::{ChangeEnvelope, ChangeFeed};
pub use ledger::{BatchOutcome, Ledger, StockMovement};
pub use locks::{DEFAULT_LOCK_TIMEOUT, LockRegistry};
pub use reporting::{InventorySummary, OrderFilter, Reporting, ShippedTotal};
pub use services::Services;
