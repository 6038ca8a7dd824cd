use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rayon::prelude::*;

use stockyard_core::{Aggregate, DomainError, DomainResult, OutboundOrderId, Quantity, Sku, WarehouseId};
use stockyard_directory::Directory;
use stockyard_inventory::{LedgerOp, MovementContext};
use stockyard_outbound::{
    CancelOutbound, ConfirmPick, CreateOutbound, OutboundCommand, OutboundEvent, OutboundLineInput,
    OutboundOrder, ShipOutbound, StartPick, validate_lines,
};

use super::commit;
use crate::feed::ChangeFeed;
use crate::ledger::{Ledger, StockMovement};
use crate::locks::{Handle, LockRegistry};

const AGGREGATE: &str = "outbound_order";

/// Per-id outcome of `ship_many`.
#[derive(Debug, Clone)]
pub struct ShipResult {
    pub order_id: OutboundOrderId,
    pub result: DomainResult<OutboundOrder>,
}

#[derive(Debug)]
pub struct OutboundEngine {
    directory: Arc<Directory>,
    ledger: Arc<Ledger>,
    orders: LockRegistry<OutboundOrderId, OutboundOrder>,
    feed: ChangeFeed,
}

impl OutboundEngine {
    pub fn new(directory: Arc<Directory>, ledger: Arc<Ledger>, feed: ChangeFeed, lock_timeout: Duration) -> Self {
        Self {
            directory,
            ledger,
            orders: LockRegistry::new(lock_timeout),
            feed,
        }
    }

    fn handle(&self, order_id: OutboundOrderId) -> DomainResult<Handle<OutboundOrder>> {
        self.orders
            .get(&order_id)
            .ok_or_else(|| DomainError::not_found(format!("outbound order {order_id}")))
    }

    /// Lock the order, run `step`, and commit its events.
    ///
    /// `step` receives the locked order and the decided events; it performs
    /// the ledger side effect (if any) before anything is applied.
    fn transition<F>(
        &self,
        order_id: OutboundOrderId,
        command: OutboundCommand,
        step: F,
    ) -> DomainResult<OutboundOrder>
    where
        F: FnOnce(&OutboundOrder, WarehouseId, &[OutboundEvent]) -> DomainResult<()>,
    {
        let handle = self.handle(order_id)?;
        let mut order = self.orders.lock(&order_id, &handle)?;
        let warehouse_id = order
            .warehouse_id()
            .ok_or_else(|| DomainError::invariant("stored outbound order without warehouse"))?;

        let events = order.handle(&command).inspect_err(|err| {
            tracing::warn!(order_id = %order_id, status = order.status().as_str(), error = %err, "outbound command rejected");
        })?;
        step(&order, warehouse_id, &events)?;
        commit(&mut *order, &events, &self.feed, warehouse_id, AGGREGATE);
        Ok(order.clone())
    }

    fn batch(order: &OutboundOrder, warehouse_id: WarehouseId, op: fn(Quantity) -> LedgerOp) -> Vec<StockMovement> {
        order
            .items()
            .iter()
            .map(|l| StockMovement::new(warehouse_id, l.sku.clone(), op(l.quantity)))
            .collect()
    }

    fn context(order_id: OutboundOrderId, operator: Option<String>) -> MovementContext {
        MovementContext::new(format!("outbound:{order_id}"), operator)
    }

    /// Create an order in `CREATED`. Nothing is reserved yet.
    pub fn create(
        &self,
        warehouse_id: WarehouseId,
        items: &[OutboundLineInput],
        created_by: Option<String>,
    ) -> DomainResult<OutboundOrder> {
        self.directory.ensure_warehouse(warehouse_id)?;
        let lines = validate_lines(items)?;
        let skus: Vec<Sku> = lines.iter().map(|l| l.sku.clone()).collect();

        let order_id = OutboundOrderId::new();
        let mut order = OutboundOrder::empty(order_id);
        let events = order.handle(&OutboundCommand::Create(CreateOutbound {
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

        tracing::info!(order_id = %order_id, warehouse_id = %warehouse_id, lines = order.items().len(), "outbound order created");
        Ok(order)
    }

    /// `CREATED -> PICKING`, reserving every line in one batch.
    pub fn start_pick(&self, order_id: OutboundOrderId, operator: Option<String>) -> DomainResult<OutboundOrder> {
        let command = OutboundCommand::StartPick(StartPick {
            order_id,
            occurred_at: Utc::now(),
        });
        let order = self.transition(order_id, command, |order, warehouse_id, _| {
            let batch = Self::batch(order, warehouse_id, LedgerOp::Reserve);
            self.ledger.apply(&batch, &Self::context(order_id, operator))?;
            Ok(())
        })?;
        tracing::info!(order_id = %order_id, "outbound pick started, stock reserved");
        Ok(order)
    }

    /// Record one scanned sku. The last outstanding sku moves the order to `PICKED`.
    pub fn confirm_pick(&self, order_id: OutboundOrderId, scanned_sku: &str) -> DomainResult<OutboundOrder> {
        let sku = Sku::parse(scanned_sku)?;
        let command = OutboundCommand::ConfirmPick(ConfirmPick {
            order_id,
            sku: sku.clone(),
            occurred_at: Utc::now(),
        });
        let order = self.transition(order_id, command, |_, _, _| Ok(()))?;
        tracing::info!(order_id = %order_id, sku = %sku, status = order.status().as_str(), "outbound sku scanned");
        Ok(order)
    }

    /// `PICKED -> SHIPPED`, committing the reserved stock out of the ledger.
    pub fn ship(&self, order_id: OutboundOrderId, operator: Option<String>) -> DomainResult<OutboundOrder> {
        let command = OutboundCommand::Ship(ShipOutbound {
            order_id,
            occurred_at: Utc::now(),
        });
        let order = self.transition(order_id, command, |order, warehouse_id, _| {
            let batch = Self::batch(order, warehouse_id, LedgerOp::CommitShipment);
            self.ledger.apply(&batch, &Self::context(order_id, operator))?;
            Ok(())
        })?;
        tracing::info!(order_id = %order_id, total_quantity = order.total_quantity(), "outbound order shipped");
        Ok(order)
    }

    /// Cancel from any non-terminal state, releasing held stock.
    pub fn cancel(&self, order_id: OutboundOrderId, operator: Option<String>) -> DomainResult<OutboundOrder> {
        let command = OutboundCommand::Cancel(CancelOutbound {
            order_id,
            occurred_at: Utc::now(),
        });
        let order = self.transition(order_id, command, |order, warehouse_id, events| {
            let releases = events
                .iter()
                .any(|e| matches!(e, OutboundEvent::Cancelled(c) if c.released_stock));
            if releases {
                let batch = Self::batch(order, warehouse_id, LedgerOp::Release);
                self.ledger.apply(&batch, &Self::context(order_id, operator))?;
            }
            Ok(())
        })?;
        tracing::info!(order_id = %order_id, "outbound order cancelled");
        Ok(order)
    }

    /// Remove a terminal order.
    pub fn delete(&self, order_id: OutboundOrderId) -> DomainResult<()> {
        let handle = self.handle(order_id)?;
        let order = self.orders.lock(&order_id, &handle)?;
        if !order.status().is_terminal() {
            return Err(DomainError::invalid_state(format!(
                "outbound order {order_id} is {}, only SHIPPED or CANCELLED orders can be deleted",
                order.status().as_str()
            )));
        }
        self.orders.remove(&order_id);
        drop(order);
        tracing::info!(order_id = %order_id, "outbound order deleted");
        Ok(())
    }

    /// Ship several orders independently and in parallel.
    ///
    /// Returns one result per input id, in input order.
    pub fn ship_many(&self, order_ids: &[OutboundOrderId], operator: Option<String>) -> Vec<ShipResult> {
        let results: Vec<ShipResult> = order_ids
            .par_iter()
            .map(|order_id| ShipResult {
                order_id: *order_id,
                result: self.ship(*order_id, operator.clone()),
            })
            .collect();
        let failed = results.iter().filter(|r| r.result.is_err()).count();
        tracing::info!(requested = order_ids.len(), failed, "batch ship finished");
        results
    }

    pub fn get(&self, order_id: OutboundOrderId) -> DomainResult<OutboundOrder> {
        let handle = self.handle(order_id)?;
        let order = self.orders.lock(&order_id, &handle)?;
        Ok(order.clone())
    }

    /// Orders newest first.
    pub fn list(&self, warehouse_id: Option<WarehouseId>) -> DomainResult<Vec<OutboundOrder>> {
        let mut orders: Vec<OutboundOrder> = self
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

    /// Whether any non-terminal order lists the sku.
    pub fn has_open_order_for(&self, sku: &Sku) -> DomainResult<bool> {
        Ok(self
            .orders
            .snapshot()?
            .iter()
            .any(|o| !o.status().is_terminal() && o.references_sku(sku)))
    }
}
