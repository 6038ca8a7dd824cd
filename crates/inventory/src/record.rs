use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockyard_core::{DomainError, DomainResult, Quantity, Shortage, Sku, WarehouseId};

/// Ledger key: one record per (warehouse, sku).
///
/// Ordering is total so multi-key batches can lock keys in a fixed order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerKey {
    pub warehouse_id: WarehouseId,
    pub sku: Sku,
}

impl LedgerKey {
    pub fn new(warehouse_id: WarehouseId, sku: Sku) -> Self {
        Self { warehouse_id, sku }
    }
}

impl core::fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.warehouse_id, self.sku)
    }
}

/// One primitive stock movement against a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "qty", rename_all = "snake_case")]
pub enum LedgerOp {
    /// available += qty (inbound confirmation).
    Receive(Quantity),
    /// available -> locked.
    Reserve(Quantity),
    /// locked -> available.
    Release(Quantity),
    /// locked -= qty (goods left the building).
    CommitShipment(Quantity),
    /// available = counted - locked.
    Reconcile(Quantity),
    SetThreshold(Quantity),
}

impl LedgerOp {
    pub fn kind(&self) -> MovementKind {
        match self {
            LedgerOp::Receive(_) => MovementKind::Receive,
            LedgerOp::Reserve(_) => MovementKind::Reserve,
            LedgerOp::Release(_) => MovementKind::Release,
            LedgerOp::CommitShipment(_) => MovementKind::Ship,
            LedgerOp::Reconcile(_) => MovementKind::Stocktake,
            LedgerOp::SetThreshold(_) => MovementKind::Threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Receive,
    Reserve,
    Release,
    Ship,
    Stocktake,
    Threshold,
}

/// Per (warehouse, sku) quantities. Both counters are never negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub warehouse_id: WarehouseId,
    pub sku: Sku,
    pub available_qty: i64,
    pub locked_qty: i64,
    pub warning_threshold: i64,
    pub updated_at: DateTime<Utc>,
}

impl InventoryRecord {
    /// Zero-initialized record, as created lazily on first movement.
    pub fn empty(key: &LedgerKey) -> Self {
        Self {
            warehouse_id: key.warehouse_id,
            sku: key.sku.clone(),
            available_qty: 0,
            locked_qty: 0,
            warning_threshold: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn key(&self) -> LedgerKey {
        LedgerKey::new(self.warehouse_id, self.sku.clone())
    }

    /// `available + locked`. Every op keeps this sum within `i64`.
    pub fn on_hand(&self) -> i64 {
        self.available_qty.saturating_add(self.locked_qty)
    }

    /// Low-stock predicate. Zero stock under a positive threshold counts.
    pub fn is_low_stock(&self) -> bool {
        self.available_qty < self.warning_threshold
    }

    /// Apply one movement. On error the record is unchanged.
    pub fn apply(&mut self, op: LedgerOp, at: DateTime<Utc>) -> DomainResult<()> {
        match op {
            LedgerOp::Receive(q) => {
                let q = positive(q)?;
                let on_hand = self.available_qty.checked_add(self.locked_qty);
                checked(on_hand.and_then(|t| t.checked_add(q)))?;
                self.available_qty += q;
            }
            LedgerOp::Reserve(q) => {
                let q = positive(q)?;
                if self.available_qty < q {
                    return Err(DomainError::InsufficientStock(vec![Shortage {
                        sku: self.sku.clone(),
                        requested: q,
                        available: self.available_qty,
                    }]));
                }
                let locked = checked(self.locked_qty.checked_add(q))?;
                self.available_qty -= q;
                self.locked_qty = locked;
            }
            LedgerOp::Release(q) => {
                let q = positive(q)?;
                if self.locked_qty < q {
                    return Err(DomainError::invariant(format!(
                        "release of {q} exceeds locked {} for {}",
                        self.locked_qty,
                        self.key()
                    )));
                }
                let available = checked(self.available_qty.checked_add(q))?;
                self.locked_qty -= q;
                self.available_qty = available;
            }
            LedgerOp::CommitShipment(q) => {
                let q = positive(q)?;
                if self.locked_qty < q {
                    return Err(DomainError::invariant(format!(
                        "shipment of {q} exceeds locked {} for {}",
                        self.locked_qty,
                        self.key()
                    )));
                }
                self.locked_qty -= q;
            }
            LedgerOp::Reconcile(counted) => {
                let counted = counted.get();
                if counted < self.locked_qty {
                    return Err(DomainError::StocktakeBelowLocked {
                        sku: self.sku.clone(),
                        counted,
                        locked: self.locked_qty,
                    });
                }
                self.available_qty = counted - self.locked_qty;
            }
            LedgerOp::SetThreshold(t) => {
                self.warning_threshold = t.get();
            }
        }
        self.updated_at = at;
        Ok(())
    }
}

fn positive(q: Quantity) -> DomainResult<i64> {
    if q.get() <= 0 {
        return Err(DomainError::validation("movement quantity must be > 0"));
    }
    Ok(q.get())
}

fn checked(v: Option<i64>) -> DomainResult<i64> {
    v.ok_or_else(|| DomainError::validation("quantity overflow"))
}
