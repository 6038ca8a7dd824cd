//! Inbound (receiving) order domain.
//!
//! Pure aggregate logic; the engine in `stockyard-infra` couples confirmation
//! to ledger receipts.

pub mod line;
pub mod order;

pub use line::{InboundLine, InboundLineInput, validate_lines};
pub use order::{
    ConfirmInbound, CreateInbound, InboundCommand, InboundConfirmed, InboundCreated, InboundEvent,
    InboundItemsReplaced, InboundOrder, InboundStatus, ReplaceInboundItems,
};
