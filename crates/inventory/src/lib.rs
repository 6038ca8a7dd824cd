//! Inventory ledger domain.
//!
//! Pure stock arithmetic for one (warehouse, sku) record plus the movement
//! audit and stocktake types. Locking and storage live in `stockyard-infra`.

pub mod movement;
pub mod record;
pub mod stocktake;

pub use movement::{Movement, MovementContext, MovementQuery};
pub use record::{InventoryRecord, LedgerKey, LedgerOp, MovementKind};
pub use stocktake::{CountedLine, Stocktake, StocktakeEntry, StocktakeLineInput, validate_counts};
