use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockyard_core::{Sku, WarehouseId};
use stockyard_events::Event;

use crate::record::{InventoryRecord, LedgerOp, MovementKind};

/// Audit entry for one applied ledger movement.
///
/// `seq` is assigned by the ledger and is strictly increasing across all keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub seq: u64,
    pub warehouse_id: WarehouseId,
    pub sku: Sku,
    pub kind: MovementKind,
    pub quantity: i64,
    pub available_before: i64,
    pub locked_before: i64,
    pub available_after: i64,
    pub locked_after: i64,
    /// Change in on-hand stock (available + locked).
    pub delta: i64,
    /// Order or stocktake that caused the movement, if any.
    pub reference: Option<String>,
    pub operator: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Who and why, attached to every movement of one ledger batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementContext {
    pub reference: Option<String>,
    pub operator: Option<String>,
}

impl MovementContext {
    pub fn new(reference: impl Into<String>, operator: Option<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            operator,
        }
    }
}

impl Movement {
    pub fn record(
        seq: u64,
        op: LedgerOp,
        before: &InventoryRecord,
        after: &InventoryRecord,
        ctx: &MovementContext,
    ) -> Self {
        let quantity = match op {
            LedgerOp::Receive(q)
            | LedgerOp::Reserve(q)
            | LedgerOp::Release(q)
            | LedgerOp::CommitShipment(q)
            | LedgerOp::Reconcile(q)
            | LedgerOp::SetThreshold(q) => q.get(),
        };
        Self {
            seq,
            warehouse_id: after.warehouse_id,
            sku: after.sku.clone(),
            kind: op.kind(),
            quantity,
            available_before: before.available_qty,
            locked_before: before.locked_qty,
            available_after: after.available_qty,
            locked_after: after.locked_qty,
            delta: after.on_hand() - before.on_hand(),
            reference: ctx.reference.clone(),
            operator: ctx.operator.clone(),
            occurred_at: after.updated_at,
        }
    }
}

impl Event for Movement {
    fn event_type(&self) -> &'static str {
        match self.kind {
            MovementKind::Receive => "inventory.received",
            MovementKind::Reserve => "inventory.reserved",
            MovementKind::Release => "inventory.released",
            MovementKind::Ship => "inventory.shipped",
            MovementKind::Stocktake => "inventory.reconciled",
            MovementKind::Threshold => "inventory.threshold_set",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
}

/// Filter for the movement log. All fields are optional and combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MovementQuery {
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    #[serde(default)]
    pub sku: Option<Sku>,
    #[serde(default)]
    pub kind: Option<MovementKind>,
    /// Most recent N entries; unbounded when absent.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl MovementQuery {
    pub fn matches(&self, m: &Movement) -> bool {
        self.warehouse_id.is_none_or(|w| m.warehouse_id == w)
            && self.sku.as_ref().is_none_or(|s| &m.sku == s)
            && self.kind.is_none_or(|k| m.kind == k)
    }
}
