//! The inventory ledger: sole owner of every `InventoryRecord`.
//!
//! Each (warehouse, sku) record sits behind its own mutex in a
//! [`LockRegistry`]. A batch touching several keys acquires them in sorted
//! `LedgerKey` order, validates every movement on working copies and writes
//! back only if all of them succeed.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;

use stockyard_core::{DomainError, DomainResult, Quantity, Shortage, Sku, WarehouseId};
use stockyard_inventory::{
    InventoryRecord, LedgerKey, LedgerOp, Movement, MovementContext, MovementQuery,
};

use crate::feed::ChangeFeed;
use crate::locks::LockRegistry;

/// One line of a ledger batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMovement {
    pub key: LedgerKey,
    pub op: LedgerOp,
}

impl StockMovement {
    pub fn new(warehouse_id: WarehouseId, sku: Sku, op: LedgerOp) -> Self {
        Self {
            key: LedgerKey::new(warehouse_id, sku),
            op,
        }
    }
}

/// Result of a committed batch.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Records after the batch, one per distinct key, in key order.
    pub records: Vec<InventoryRecord>,
    /// Audit entries in application order.
    pub movements: Vec<Movement>,
}

#[derive(Debug, Default)]
struct MovementLog {
    entries: Vec<Movement>,
    next_seq: u64,
}

#[derive(Debug)]
pub struct Ledger {
    records: LockRegistry<LedgerKey, InventoryRecord>,
    log: RwLock<MovementLog>,
    feed: ChangeFeed,
}

impl Ledger {
    pub fn new(lock_timeout: Duration, feed: ChangeFeed) -> Self {
        Self {
            records: LockRegistry::new(lock_timeout),
            log: RwLock::new(MovementLog::default()),
            feed,
        }
    }

    /// Current record for the key, zero-initialized on first access.
    pub fn get_or_create(&self, warehouse_id: WarehouseId, sku: &Sku) -> DomainResult<InventoryRecord> {
        let key = LedgerKey::new(warehouse_id, sku.clone());
        let handle = self.records.get_or_insert_with(&key, || InventoryRecord::empty(&key));
        let guard = self.records.lock(&key, &handle)?;
        Ok(guard.clone())
    }

    pub fn get(&self, warehouse_id: WarehouseId, sku: &Sku) -> DomainResult<Option<InventoryRecord>> {
        let key = LedgerKey::new(warehouse_id, sku.clone());
        match self.records.get(&key) {
            Some(handle) => Ok(Some(self.records.lock(&key, &handle)?.clone())),
            None => Ok(None),
        }
    }

    pub fn reserve(
        &self,
        warehouse_id: WarehouseId,
        sku: &Sku,
        qty: Quantity,
        ctx: &MovementContext,
    ) -> DomainResult<InventoryRecord> {
        self.apply_one(warehouse_id, sku, LedgerOp::Reserve(qty), ctx)
    }

    pub fn release(
        &self,
        warehouse_id: WarehouseId,
        sku: &Sku,
        qty: Quantity,
        ctx: &MovementContext,
    ) -> DomainResult<InventoryRecord> {
        self.apply_one(warehouse_id, sku, LedgerOp::Release(qty), ctx)
    }

    pub fn commit_shipment(
        &self,
        warehouse_id: WarehouseId,
        sku: &Sku,
        qty: Quantity,
        ctx: &MovementContext,
    ) -> DomainResult<InventoryRecord> {
        self.apply_one(warehouse_id, sku, LedgerOp::CommitShipment(qty), ctx)
    }

    pub fn receive(
        &self,
        warehouse_id: WarehouseId,
        sku: &Sku,
        qty: Quantity,
        ctx: &MovementContext,
    ) -> DomainResult<InventoryRecord> {
        self.apply_one(warehouse_id, sku, LedgerOp::Receive(qty), ctx)
    }

    pub fn reconcile(
        &self,
        warehouse_id: WarehouseId,
        sku: &Sku,
        counted: Quantity,
        ctx: &MovementContext,
    ) -> DomainResult<InventoryRecord> {
        self.apply_one(warehouse_id, sku, LedgerOp::Reconcile(counted), ctx)
    }

    pub fn set_threshold(
        &self,
        warehouse_id: WarehouseId,
        sku: &Sku,
        threshold: Quantity,
        ctx: &MovementContext,
    ) -> DomainResult<InventoryRecord> {
        self.apply_one(warehouse_id, sku, LedgerOp::SetThreshold(threshold), ctx)
    }

    fn apply_one(
        &self,
        warehouse_id: WarehouseId,
        sku: &Sku,
        op: LedgerOp,
        ctx: &MovementContext,
    ) -> DomainResult<InventoryRecord> {
        let outcome = self.apply(&[StockMovement::new(warehouse_id, sku.clone(), op)], ctx)?;
        outcome
            .records
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::invariant("single-movement batch produced no record"))
    }

    /// Apply a batch all-or-nothing.
    ///
    /// Reservation shortages are collected across the whole batch so the
    /// error lists every short sku. Any other failure aborts immediately.
    pub fn apply(&self, batch: &[StockMovement], ctx: &MovementContext) -> DomainResult<BatchOutcome> {
        if batch.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let keys: BTreeSet<LedgerKey> = batch.iter().map(|m| m.key.clone()).collect();
        let handles: Vec<_> = keys
            .iter()
            .map(|k| (k, self.records.get_or_insert_with(k, || InventoryRecord::empty(k))))
            .collect();

        // Sorted acquisition; an early return drops whatever is already held.
        let mut guards = Vec::with_capacity(handles.len());
        for (key, handle) in &handles {
            guards.push(self.records.lock(key, handle)?);
        }

        let mut working: BTreeMap<LedgerKey, InventoryRecord> = guards
            .iter()
            .map(|g| (g.key(), (**g).clone()))
            .collect();

        let now = Utc::now();
        let mut shortages: Vec<Shortage> = Vec::new();
        let mut applied: Vec<(LedgerOp, InventoryRecord, InventoryRecord)> = Vec::with_capacity(batch.len());

        for movement in batch {
            let record = working
                .get_mut(&movement.key)
                .ok_or_else(|| DomainError::invariant(format!("{} missing from batch", movement.key)))?;
            let before = record.clone();
            match record.apply(movement.op, now) {
                Ok(()) => applied.push((movement.op, before, record.clone())),
                Err(DomainError::InsufficientStock(mut short)) => shortages.append(&mut short),
                Err(err) => {
                    if matches!(err, DomainError::InvariantViolation(_)) {
                        tracing::error!(key = %movement.key, reference = ?ctx.reference, error = %err, "ledger invariant violated");
                    } else {
                        tracing::warn!(key = %movement.key, reference = ?ctx.reference, error = %err, "ledger movement rejected");
                    }
                    return Err(err);
                }
            }
        }

        if !shortages.is_empty() {
            let err = DomainError::InsufficientStock(shortages);
            tracing::warn!(reference = ?ctx.reference, error = %err, "ledger batch rejected");
            return Err(err);
        }

        // Audit entries and records are written together under the key
        // locks, so per-key movement order matches commit order.
        let movements = {
            let mut log = self.log.write();
            let mut out = Vec::with_capacity(applied.len());
            for (op, before, after) in &applied {
                let m = Movement::record(log.next_seq + 1, *op, before, after, ctx);
                log.next_seq += 1;
                log.entries.push(m.clone());
                out.push(m);
            }
            for guard in guards.iter_mut() {
                if let Some(updated) = working.remove(&guard.key()) {
                    **guard = updated;
                }
            }
            out
        };
        let records: Vec<InventoryRecord> = guards.iter().map(|g| (**g).clone()).collect();
        drop(guards);

        for m in &movements {
            self.feed
                .publish(m.warehouse_id, "inventory", format!("{}/{}", m.warehouse_id, m.sku), m.seq, m);
        }

        Ok(BatchOutcome { records, movements })
    }

    /// Snapshot of records, optionally narrowed to a warehouse and a
    /// case-insensitive sku substring. Sorted by (warehouse, sku).
    pub fn list(&self, warehouse_id: Option<WarehouseId>, sku_filter: Option<&str>) -> DomainResult<Vec<InventoryRecord>> {
        let needle = sku_filter
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let mut records: Vec<InventoryRecord> = self
            .records
            .snapshot()?
            .into_iter()
            .filter(|r| warehouse_id.is_none_or(|w| r.warehouse_id == w))
            .filter(|r| {
                needle
                    .as_deref()
                    .is_none_or(|n| r.sku.as_str().to_lowercase().contains(n))
            })
            .collect();
        records.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(records)
    }

    /// Records whose available quantity is below their warning threshold.
    pub fn list_warnings(&self, warehouse_id: Option<WarehouseId>) -> DomainResult<Vec<InventoryRecord>> {
        Ok(self
            .list(warehouse_id, None)?
            .into_iter()
            .filter(InventoryRecord::is_low_stock)
            .collect())
    }

    /// Audit trail, oldest first. `limit` keeps the most recent entries.
    pub fn movements(&self, query: &MovementQuery) -> Vec<Movement> {
        let log = self.log.read();
        let mut out: Vec<Movement> = log.entries.iter().filter(|m| query.matches(m)).cloned().collect();
        if let Some(limit) = query.limit {
            let skip = out.len().saturating_sub(limit);
            out.drain(..skip);
        }
        out
    }

    /// Drop every record of `sku` that holds no stock, e.g. threshold-only
    /// records left behind by a deleted product. Returns how many went.
    pub fn remove_empty(&self, sku: &Sku) -> DomainResult<usize> {
        let mut removed = 0;
        for (key, handle) in self.records.handles() {
            if &key.sku != sku {
                continue;
            }
            let record = self.records.lock(&key, &handle)?;
            if record.on_hand() == 0 {
                self.records.remove(&key);
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(sku = %sku, removed, "empty inventory records removed");
        }
        Ok(removed)
    }

    /// Total available + locked for a sku across all warehouses.
    pub fn on_hand(&self, sku: &Sku) -> DomainResult<i64> {
        Ok(self
            .records
            .snapshot()?
            .iter()
            .filter(|r| &r.sku == sku)
            .fold(0i64, |acc, r| acc.saturating_add(r.on_hand())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    use stockyard_inventory::MovementKind;

    fn ledger() -> Ledger {
        Ledger::new(Duration::from_millis(200), ChangeFeed::new())
    }

    fn sku(s: &str) -> Sku {
        Sku::parse(s).unwrap()
    }

    fn q(v: i64) -> Quantity {
        Quantity::new(v).unwrap()
    }

    fn wh() -> WarehouseId {
        WarehouseId::new(1)
    }

    fn ctx() -> MovementContext {
        MovementContext::new("test", None)
    }

    #[test]
    fn records_are_created_lazily_with_zeroes() {
        let l = ledger();
        assert!(l.get(wh(), &sku("A")).unwrap().is_none());
        let r = l.get_or_create(wh(), &sku("A")).unwrap();
        assert_eq!((r.available_qty, r.locked_qty, r.warning_threshold), (0, 0, 0));
        assert!(l.get(wh(), &sku("A")).unwrap().is_some());
    }

    #[test]
    fn batch_reports_every_short_sku_and_changes_nothing() {
        let l = ledger();
        l.receive(wh(), &sku("A"), q(10), &ctx()).unwrap();
        l.receive(wh(), &sku("B"), q(1), &ctx()).unwrap();

        let batch = vec![
            StockMovement::new(wh(), sku("A"), LedgerOp::Reserve(q(5))),
            StockMovement::new(wh(), sku("B"), LedgerOp::Reserve(q(3))),
            StockMovement::new(wh(), sku("C"), LedgerOp::Reserve(q(1))),
        ];
        let err = l.apply(&batch, &ctx()).unwrap_err();
        let short: Vec<&str> = err.shortages().iter().map(|s| s.sku.as_str()).collect();
        assert_eq!(short, vec!["B", "C"]);

        let a = l.get_or_create(wh(), &sku("A")).unwrap();
        assert_eq!((a.available_qty, a.locked_qty), (10, 0));
        assert_eq!(l.movements(&MovementQuery::default()).len(), 2);
    }

    #[test]
    fn invariant_failure_rolls_back_the_whole_batch() {
        let l = ledger();
        l.receive(wh(), &sku("A"), q(10), &ctx()).unwrap();

        let batch = vec![
            StockMovement::new(wh(), sku("A"), LedgerOp::Reserve(q(4))),
            StockMovement::new(wh(), sku("A"), LedgerOp::CommitShipment(q(5))),
        ];
        let err = l.apply(&batch, &ctx()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        let a = l.get_or_create(wh(), &sku("A")).unwrap();
        assert_eq!((a.available_qty, a.locked_qty), (10, 0));
    }

    #[test]
    fn receive_overflowing_on_hand_is_rejected_without_a_trace() {
        let l = ledger();
        l.receive(wh(), &sku("A"), q(5), &ctx()).unwrap();
        l.reserve(wh(), &sku("A"), q(5), &ctx()).unwrap();

        let err = l.receive(wh(), &sku("A"), q(i64::MAX), &ctx()).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        let a = l.get_or_create(wh(), &sku("A")).unwrap();
        assert_eq!((a.available_qty, a.locked_qty), (0, 5));
        assert_eq!(l.movements(&MovementQuery::default()).len(), 2);

        l.receive(WarehouseId::new(2), &sku("A"), q(i64::MAX), &ctx()).unwrap();
        assert_eq!(l.on_hand(&sku("A")).unwrap(), i64::MAX);
    }

    #[test]
    fn remove_empty_keeps_records_with_stock() {
        let l = ledger();
        l.set_threshold(wh(), &sku("A"), q(5), &ctx()).unwrap();
        l.receive(WarehouseId::new(2), &sku("A"), q(1), &ctx()).unwrap();
        l.set_threshold(wh(), &sku("B"), q(5), &ctx()).unwrap();

        assert_eq!(l.remove_empty(&sku("A")).unwrap(), 1);
        assert!(l.get(wh(), &sku("A")).unwrap().is_none());
        assert!(l.get(WarehouseId::new(2), &sku("A")).unwrap().is_some());
        assert!(l.get(wh(), &sku("B")).unwrap().is_some());
    }

    #[test]
    fn movements_record_before_after_and_reference() {
        let l = ledger();
        let ctx = MovementContext::new("outbound:1", Some("bob".into()));
        l.receive(wh(), &sku("A"), q(8), &ctx).unwrap();
        l.reserve(wh(), &sku("A"), q(3), &ctx).unwrap();
        l.commit_shipment(wh(), &sku("A"), q(3), &ctx).unwrap();

        let log = l.movements(&MovementQuery::default());
        assert_eq!(log.len(), 3);
        assert_eq!(log.iter().map(|m| m.seq).collect::<Vec<_>>(), vec![1, 2, 3]);
        let ship = &log[2];
        assert_eq!(ship.kind, MovementKind::Ship);
        assert_eq!((ship.locked_before, ship.locked_after), (3, 0));
        assert_eq!(ship.delta, -3);
        assert_eq!(ship.reference.as_deref(), Some("outbound:1"));

        let limited = l.movements(&MovementQuery {
            limit: Some(1),
            ..MovementQuery::default()
        });
        assert_eq!(limited[0].seq, 3);
    }

    #[test]
    fn list_filters_by_sku_substring_case_insensitively() {
        let l = ledger();
        l.receive(wh(), &sku("BOLT-1"), q(1), &ctx()).unwrap();
        l.receive(WarehouseId::new(2), &sku("bolt-2"), q(1), &ctx()).unwrap();
        l.receive(wh(), &sku("NUT-1"), q(1), &ctx()).unwrap();

        assert_eq!(l.list(None, Some("bolt")).unwrap().len(), 2);
        assert_eq!(l.list(Some(wh()), Some("BOLT")).unwrap().len(), 1);
        assert_eq!(l.list(Some(wh()), Some("' OR 1=1 --")).unwrap().len(), 0);
        assert_eq!(l.list(None, None).unwrap().len(), 3);
    }

    #[test]
    fn warnings_include_zero_stock() {
        let l = ledger();
        l.set_threshold(wh(), &sku("A"), q(5), &ctx()).unwrap();
        l.receive(wh(), &sku("B"), q(10), &ctx()).unwrap();
        l.set_threshold(wh(), &sku("B"), q(5), &ctx()).unwrap();

        let warnings = l.list_warnings(None).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].sku.as_str(), "A");
        assert_eq!(warnings[0].available_qty, 0);
    }

    #[test]
    fn on_hand_sums_across_warehouses() {
        let l = ledger();
        l.receive(wh(), &sku("A"), q(4), &ctx()).unwrap();
        l.receive(WarehouseId::new(2), &sku("A"), q(6), &ctx()).unwrap();
        l.reserve(WarehouseId::new(2), &sku("A"), q(2), &ctx()).unwrap();
        assert_eq!(l.on_hand(&sku("A")).unwrap(), 10);
        assert_eq!(l.on_hand(&sku("Z")).unwrap(), 0);
    }

    #[test]
    fn concurrent_reservations_never_oversell() {
        let l = Arc::new(Ledger::new(Duration::from_secs(5), ChangeFeed::new()));
        l.receive(wh(), &sku("A"), q(100), &ctx()).unwrap();

        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let (l, barrier) = (l.clone(), barrier.clone());
                thread::spawn(move || {
                    barrier.wait();
                    (0..10)
                        .filter(|_| l.reserve(wh(), &sku("A"), q(1), &ctx()).is_ok())
                        .count()
                })
            })
            .collect();
        let reserved: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        let a = l.get_or_create(wh(), &sku("A")).unwrap();
        assert_eq!(reserved, 100);
        assert_eq!((a.available_qty, a.locked_qty), (0, 100));
    }

    #[test]
    fn opposite_key_orders_do_not_deadlock() {
        let l = Arc::new(Ledger::new(Duration::from_secs(5), ChangeFeed::new()));
        l.receive(wh(), &sku("A"), q(1000), &ctx()).unwrap();
        l.receive(wh(), &sku("B"), q(1000), &ctx()).unwrap();

        let forward = vec![
            StockMovement::new(wh(), sku("A"), LedgerOp::Reserve(q(1))),
            StockMovement::new(wh(), sku("B"), LedgerOp::Reserve(q(1))),
        ];
        let backward: Vec<StockMovement> = forward.iter().rev().cloned().collect();

        let handles: Vec<_> = [forward, backward]
            .into_iter()
            .map(|batch| {
                let l = l.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        l.apply(&batch, &ctx()).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(l.get_or_create(wh(), &sku("A")).unwrap().locked_qty, 400);
        assert_eq!(l.get_or_create(wh(), &sku("B")).unwrap().locked_qty, 400);
    }

    #[test]
    fn committed_movements_reach_the_feed() {
        let feed = ChangeFeed::new();
        let sub = feed.subscribe();
        let l = Ledger::new(Duration::from_millis(200), feed);
        l.receive(wh(), &sku("A"), q(2), &ctx()).unwrap();

        let env = sub.try_recv().unwrap();
        assert_eq!(env.event_type(), "inventory.received");
        assert_eq!(env.warehouse_id(), wh());
        assert_eq!(env.aggregate_id(), "1/A");
    }
}
