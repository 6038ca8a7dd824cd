//! Outbound (fulfillment) order domain.

pub mod line;
pub mod order;

pub use line::{OutboundLine, OutboundLineInput, total_quantity, validate_lines};
pub use order::{
    CancelOutbound, ConfirmPick, CreateOutbound, OutboundCancelled, OutboundCommand,
    OutboundCreated, OutboundEvent, OutboundOrder, OutboundShipped, OutboundStatus, PickCompleted,
    PickStarted, ShipOutbound, SkuScanned, StartPick,
};
