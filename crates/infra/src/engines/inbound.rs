use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use stockyard_core::{Aggregate, DomainError, DomainResult, InboundOrderId, Sku, WarehouseId};
use stockyard_directory::Directory;
use stockyard_inbound::{
    ConfirmInbound, CreateInbound, InboundCommand, InboundLineInput, InboundOrder, InboundStatus,
    ReplaceInboundItems, validate_lines,
};
use stockyard_inventory::{LedgerOp, MovementContext};

use super::commit;
use crate::feed::ChangeFeed;
use crate::ledger::{Ledger, StockMovement};
use crate::locks::{Handle, LockRegistry};

const AGGREGATE: &str = "inbound_order";

/// Result of `confirm`. `newly_confirmed` is false when the order had
/// already been confirmed and nothing was credited.
#[derive(Debug, Clone)]
pub struct ConfirmOutcome {
    pub order: InboundOrder,
    pub newly_confirmed: bool,
}

#[derive(Debug)]
pub struct InboundEngine {
    directory: Arc<Directory>,
    ledger: Arc<Ledger>,
    orders: LockRegistry<InboundOrderId, InboundOrder>,
    feed: ChangeFeed,
}

impl InboundEngine {
    pub fn new(directory: Arc<Directory>, ledger: Arc<Ledger>, feed: ChangeFeed, lock_timeout: Duration) -> Self {
        Self {
            directory,
            ledger,
            orders: LockRegistry::new(lock_timeout),
            feed,
        }
    }

    fn handle(&self, order_id: InboundOrderId) -> DomainResult<Handle<InboundOrder>> {
        self.orders
            .get(&order_id)
            .ok_or_else(|| DomainError::not_found(format!("inbound order {order_id}")))
    }

    pub fn create(
        &self,
        warehouse_id: WarehouseId,
        items: &[InboundLineInput],
        created_by: Option<String>,
    ) -> DomainResult<InboundOrder> {
        self.directory.ensure_warehouse(warehouse_id)?;
        let lines = validate_lines(items)?;
        let skus: Vec<Sku> = lines.iter().map(|l| l.sku.clone()).collect();

        let order_id = InboundOrderId::new();
        let mut order = InboundOrder::empty(order_id);
        let events = order.handle(&InboundCommand::Create(CreateInbound {
            order_id,
            warehouse_id,
            items: lines,
            created_by,
            occurred_at: Utc::now(),
        }))?;
        order.apply_all(&events);

        self.directory.with_products(&skus, || {
            self.orders.insert_new(order_id, order.clone())?;
            Ok(())
        })?;
        for (idx, event) in events.iter().enumerate() {
            self.feed.publish(warehouse_id, AGGREGATE, order_id, idx as u64 + 1, event);
        }

        tracing::info!(order_id = %order_id, warehouse_id = %warehouse_id, lines = order.items().len(), "inbound order created");
        Ok(order)
    }

    /// Replace every line while the order is still `CREATED`.
    pub fn replace_items(&self, order_id: InboundOrderId, items: &[InboundLineInput]) -> DomainResult<InboundOrder> {
        let lines = validate_lines(items)?;
        let skus: Vec<Sku> = lines.iter().map(|l| l.sku.clone()).collect();
        let handle = self.handle(order_id)?;

        self.directory.with_products(&skus, || {
            let mut order = self.orders.lock(&order_id, &handle)?;
            let warehouse_id = order
                .warehouse_id()
                .ok_or_else(|| DomainError::invariant("stored inbound order without warehouse"))?;
            let events = order.handle(&InboundCommand::ReplaceItems(ReplaceInboundItems {
                order_id,
                items: lines,
                occurred_at: Utc::now(),
            }))?;
            commit(&mut *order, &events, &self.feed, warehouse_id, AGGREGATE);

            tracing::info!(order_id = %order_id, lines = order.items().len(), "inbound items replaced");
            Ok(order.clone())
        })
    }

    /// Credit every line to the ledger and mark the order `CONFIRMED`.
    ///
    /// Idempotent: confirming an already confirmed order returns it unchanged.
    pub fn confirm(&self, order_id: InboundOrderId, operator: Option<String>) -> DomainResult<ConfirmOutcome> {
        let handle = self.handle(order_id)?;
        let mut order = self.orders.lock(&order_id, &handle)?;

        if order.status() == InboundStatus::Confirmed {
            tracing::info!(order_id = %order_id, "inbound order already confirmed");
            return Ok(ConfirmOutcome {
                order: order.clone(),
                newly_confirmed: false,
            });
        }

        let events = order.handle(&InboundCommand::Confirm(ConfirmInbound {
            order_id,
            occurred_at: Utc::now(),
        }))?;
        let warehouse_id = order
            .warehouse_id()
            .ok_or_else(|| DomainError::invariant("stored inbound order without warehouse"))?;

        let batch: Vec<StockMovement> = order
            .items()
            .iter()
            .map(|l| StockMovement::new(warehouse_id, l.sku.clone(), LedgerOp::Receive(l.quantity)))
            .collect();
        self.ledger
            .apply(&batch, &MovementContext::new(format!("inbound:{order_id}"), operator))?;

        commit(&mut *order, &events, &self.feed, warehouse_id, AGGREGATE);
        tracing::info!(
            order_id = %order_id,
            warehouse_id = %warehouse_id,
            total_quantity = order.total_quantity(),
            "inbound order confirmed"
        );
        Ok(ConfirmOutcome {
            order: order.clone(),
            newly_confirmed: true,
        })
    }

    pub fn get(&self, order_id: InboundOrderId) -> DomainResult<InboundOrder> {
        let handle = self.handle(order_id)?;
        let order = self.orders.lock(&order_id, &handle)?;
        Ok(order.clone())
    }

    /// Orders newest first.
    pub fn list(&self, warehouse_id: Option<WarehouseId>) -> DomainResult<Vec<InboundOrder>> {
        let mut orders: Vec<InboundOrder> = self
            .orders
            .snapshot()?
            .into_iter()
            .filter(|o| warehouse_id.is_none_or(|w| o.warehouse_id() == Some(w)))
            .collect();
        orders.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_typed().cmp(&a.id_typed()))
        });
        Ok(orders)
    }

    /// Whether any still-open order lists the sku.
    pub fn has_open_order_for(&self, sku: &Sku) -> DomainResult<bool> {
        Ok(self
            .orders
            .snapshot()?
            .iter()
            .any(|o| o.status().is_open() && o.items().iter().any(|l| &l.sku == sku)))
    }
}
