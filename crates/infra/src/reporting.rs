//! Read-side façade plus the stocktake workflow.
//!
//! API handlers never touch the ledger directly; every inventory read and the
//! two inventory writes exposed over HTTP (thresholds, stocktakes) go through
//! here.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use stockyard_core::{
    DomainError, DomainResult, NumericInput, ProductId, Quantity, Sku, StocktakeId, WarehouseId,
};
use stockyard_directory::{Directory, Product};
use stockyard_inbound::{InboundOrder, InboundStatus};
use stockyard_inventory::{
    InventoryRecord, LedgerOp, Movement, MovementContext, MovementKind, MovementQuery, Stocktake,
    StocktakeEntry, StocktakeLineInput, validate_counts,
};
use stockyard_outbound::{OutboundOrder, OutboundStatus};

use crate::engines::{InboundEngine, OutboundEngine};
use crate::ledger::{Ledger, StockMovement};

/// Order list filter. Both fields combine with AND.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderFilter<S> {
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    #[serde(default)]
    pub status: Option<S>,
}

impl<S> Default for OrderFilter<S> {
    fn default() -> Self {
        Self {
            warehouse_id: None,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventorySummary {
    pub records: usize,
    pub total_available: i64,
    pub total_locked: i64,
    pub warnings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippedTotal {
    pub sku: Sku,
    pub quantity: i64,
}

#[derive(Debug)]
pub struct Reporting {
    directory: Arc<Directory>,
    ledger: Arc<Ledger>,
    inbound: Arc<InboundEngine>,
    outbound: Arc<OutboundEngine>,
    stocktakes: RwLock<Vec<Stocktake>>,
}

impl Reporting {
    pub fn new(
        directory: Arc<Directory>,
        ledger: Arc<Ledger>,
        inbound: Arc<InboundEngine>,
        outbound: Arc<OutboundEngine>,
    ) -> Self {
        Self {
            directory,
            ledger,
            inbound,
            outbound,
            stocktakes: RwLock::new(Vec::new()),
        }
    }

    pub fn list_inbound(&self, filter: &OrderFilter<InboundStatus>) -> DomainResult<Vec<InboundOrder>> {
        Ok(self
            .inbound
            .list(filter.warehouse_id)?
            .into_iter()
            .filter(|o| filter.status.is_none_or(|s| o.status() == s))
            .collect())
    }

    pub fn list_outbound(&self, filter: &OrderFilter<OutboundStatus>) -> DomainResult<Vec<OutboundOrder>> {
        Ok(self
            .outbound
            .list(filter.warehouse_id)?
            .into_iter()
            .filter(|o| filter.status.is_none_or(|s| o.status() == s))
            .collect())
    }

    pub fn list_inventory(
        &self,
        warehouse_id: Option<WarehouseId>,
        sku: Option<&str>,
    ) -> DomainResult<Vec<InventoryRecord>> {
        self.ledger.list(warehouse_id, sku)
    }

    pub fn low_stock(&self, warehouse_id: Option<WarehouseId>) -> DomainResult<Vec<InventoryRecord>> {
        self.ledger.list_warnings(warehouse_id)
    }

    pub fn inventory_summary(&self, warehouse_id: Option<WarehouseId>) -> DomainResult<InventorySummary> {
        let records = self.ledger.list(warehouse_id, None)?;
        Ok(records.iter().fold(InventorySummary::default(), |mut acc, r| {
            acc.records += 1;
            acc.total_available = acc.total_available.saturating_add(r.available_qty);
            acc.total_locked = acc.total_locked.saturating_add(r.locked_qty);
            if r.is_low_stock() {
                acc.warnings += 1;
            }
            acc
        }))
    }

    /// Shipped quantity per sku, from the movement log. Sorted by sku.
    pub fn shipped_totals(&self, warehouse_id: Option<WarehouseId>) -> Vec<ShippedTotal> {
        let query = MovementQuery {
            warehouse_id,
            kind: Some(MovementKind::Ship),
            ..MovementQuery::default()
        };
        let mut totals: BTreeMap<Sku, i64> = BTreeMap::new();
        for m in self.ledger.movements(&query) {
            let total = totals.entry(m.sku).or_default();
            *total = total.saturating_add(m.quantity);
        }
        totals
            .into_iter()
            .map(|(sku, quantity)| ShippedTotal { sku, quantity })
            .collect()
    }

    pub fn movements(&self, query: &MovementQuery) -> Vec<Movement> {
        self.ledger.movements(query)
    }

    pub fn set_threshold(
        &self,
        warehouse_id: WarehouseId,
        sku: &str,
        threshold: &NumericInput,
        operator: Option<String>,
    ) -> DomainResult<InventoryRecord> {
        self.directory.ensure_warehouse(warehouse_id)?;
        let sku = Sku::parse(sku)?;
        self.directory.product_by_sku(&sku)?;
        let threshold = Quantity::non_negative(threshold, "warning_threshold")?;

        let record = self.ledger.set_threshold(
            warehouse_id,
            &sku,
            threshold,
            &MovementContext {
                reference: None,
                operator,
            },
        )?;
        tracing::info!(warehouse_id = %warehouse_id, sku = %sku, threshold = threshold.get(), "warning threshold set");
        Ok(record)
    }

    /// Reconcile every counted line in one ledger batch and record the stocktake.
    pub fn submit_stocktake(
        &self,
        warehouse_id: WarehouseId,
        entries: &[StocktakeLineInput],
        submitted_by: Option<String>,
    ) -> DomainResult<(Stocktake, Vec<InventoryRecord>)> {
        self.directory.ensure_warehouse(warehouse_id)?;
        let counts = validate_counts(entries)?;
        for line in &counts {
            self.directory.product_by_sku(&line.sku)?;
        }

        let id = StocktakeId::new();
        let batch: Vec<StockMovement> = counts
            .iter()
            .map(|l| StockMovement::new(warehouse_id, l.sku.clone(), LedgerOp::Reconcile(l.counted)))
            .collect();
        let outcome = self
            .ledger
            .apply(&batch, &MovementContext::new(format!("stocktake:{id}"), submitted_by.clone()))?;

        let entries: Vec<StocktakeEntry> = outcome
            .movements
            .iter()
            .map(|m| StocktakeEntry {
                sku: m.sku.clone(),
                counted_qty: m.quantity,
                delta: m.available_after - m.available_before,
                applied_at: m.occurred_at,
            })
            .collect();
        let stocktake = Stocktake {
            id,
            warehouse_id,
            entries,
            submitted_by,
            submitted_at: Utc::now(),
        };
        self.stocktakes.write().push(stocktake.clone());

        tracing::info!(stocktake_id = %id, warehouse_id = %warehouse_id, lines = stocktake.entries.len(), "stocktake applied");
        Ok((stocktake, outcome.records))
    }

    /// Stocktakes newest first.
    pub fn list_stocktakes(&self, warehouse_id: Option<WarehouseId>) -> Vec<Stocktake> {
        self.stocktakes
            .read()
            .iter()
            .rev()
            .filter(|s| warehouse_id.is_none_or(|w| s.warehouse_id == w))
            .cloned()
            .collect()
    }

    /// Delete a product unless an open order or on-hand stock still refers to it.
    /// Its empty ledger records go with it.
    pub fn delete_product(&self, id: ProductId) -> DomainResult<Product> {
        let product = self.directory.delete_product(id, |p| {
            if self.inbound.has_open_order_for(&p.sku)? || self.outbound.has_open_order_for(&p.sku)? {
                return Err(DomainError::conflict(format!(
                    "product {} is referenced by an open order",
                    p.sku
                )));
            }
            let on_hand = self.ledger.on_hand(&p.sku)?;
            if on_hand > 0 {
                return Err(DomainError::conflict(format!(
                    "product {} still has {on_hand} units on hand",
                    p.sku
                )));
            }
            self.ledger.remove_empty(&p.sku)?;
            Ok(())
        })?;
        tracing::info!(product_id = %id, sku = %product.sku, "product deleted");
        Ok(product)
    }
}
