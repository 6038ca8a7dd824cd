use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockyard_core::{Aggregate, AggregateRoot, DomainError, OutboundOrderId, Sku, WarehouseId};
use stockyard_events::Event;

use crate::line::{OutboundLine, total_quantity};

/// Outbound order status lifecycle.
///
/// ```text
/// Created -> Picking -> Picked -> Shipped
///    \          \          \
///     +----------+----------+--> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboundStatus {
    Created,
    Picking,
    Picked,
    Shipped,
    Cancelled,
}

impl OutboundStatus {
    pub fn can_transition_to(self, next: OutboundStatus) -> bool {
        use OutboundStatus::*;
        matches!(
            (self, next),
            (Created, Picking)
                | (Picking, Picked)
                | (Picked, Shipped)
                | (Created, Cancelled)
                | (Picking, Cancelled)
                | (Picked, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OutboundStatus::Shipped | OutboundStatus::Cancelled)
    }

    /// Whether stock for every line is currently locked by this order.
    pub fn holds_reservation(self) -> bool {
        matches!(self, OutboundStatus::Picking | OutboundStatus::Picked)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OutboundStatus::Created => "CREATED",
            OutboundStatus::Picking => "PICKING",
            OutboundStatus::Picked => "PICKED",
            OutboundStatus::Shipped => "SHIPPED",
            OutboundStatus::Cancelled => "CANCELLED",
        }
    }
}

impl core::str::FromStr for OutboundStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Ok(OutboundStatus::Created),
            "PICKING" => Ok(OutboundStatus::Picking),
            "PICKED" => Ok(OutboundStatus::Picked),
            "SHIPPED" => Ok(OutboundStatus::Shipped),
            "CANCELLED" => Ok(OutboundStatus::Cancelled),
            other => Err(DomainError::validation(format!("unknown outbound status {other:?}"))),
        }
    }
}

/// Aggregate root: OutboundOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundOrder {
    id: OutboundOrderId,
    warehouse_id: Option<WarehouseId>,
    status: OutboundStatus,
    items: Vec<OutboundLine>,
    total_quantity: i64,
    created_by: Option<String>,
    created_at: Option<DateTime<Utc>>,
    picked_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl OutboundOrder {
    pub fn empty(id: OutboundOrderId) -> Self {
        Self {
            id,
            warehouse_id: None,
            status: OutboundStatus::Created,
            items: Vec::new(),
            total_quantity: 0,
            created_by: None,
            created_at: None,
            picked_at: None,
            shipped_at: None,
            cancelled_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OutboundOrderId {
        self.id
    }

    pub fn warehouse_id(&self) -> Option<WarehouseId> {
        self.warehouse_id
    }

    pub fn status(&self) -> OutboundStatus {
        self.status
    }

    pub fn items(&self) -> &[OutboundLine] {
        &self.items
    }

    pub fn total_quantity(&self) -> i64 {
        self.total_quantity
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn picked_at(&self) -> Option<DateTime<Utc>> {
        self.picked_at
    }

    pub fn shipped_at(&self) -> Option<DateTime<Utc>> {
        self.shipped_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn references_sku(&self, sku: &Sku) -> bool {
        self.items.iter().any(|l| &l.sku == sku)
    }
}

impl AggregateRoot for OutboundOrder {
    type Id = OutboundOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateOutbound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOutbound {
    pub order_id: OutboundOrderId,
    pub warehouse_id: WarehouseId,
    pub items: Vec<OutboundLine>,
    pub created_by: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: StartPick. The engine reserves stock before the event is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPick {
    pub order_id: OutboundOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmPick (one scanned sku).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmPick {
    pub order_id: OutboundOrderId,
    pub sku: Sku,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ShipOutbound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipOutbound {
    pub order_id: OutboundOrderId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelOutbound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelOutbound {
    pub order_id: OutboundOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutboundCommand {
    Create(CreateOutbound),
    StartPick(StartPick),
    ConfirmPick(ConfirmPick),
    Ship(ShipOutbound),
    Cancel(CancelOutbound),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundCreated {
    pub order_id: OutboundOrderId,
    pub warehouse_id: WarehouseId,
    pub items: Vec<OutboundLine>,
    pub total_quantity: i64,
    pub created_by: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickStarted {
    pub order_id: OutboundOrderId,
    pub warehouse_id: WarehouseId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkuScanned {
    pub order_id: OutboundOrderId,
    pub sku: Sku,
    pub occurred_at: DateTime<Utc>,
}

/// Every line has been scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickCompleted {
    pub order_id: OutboundOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundShipped {
    pub order_id: OutboundOrderId,
    pub warehouse_id: WarehouseId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundCancelled {
    pub order_id: OutboundOrderId,
    pub warehouse_id: WarehouseId,
    /// True when the order held a reservation that had to be released.
    pub released_stock: bool,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum OutboundEvent {
    Created(OutboundCreated),
    PickStarted(PickStarted),
    SkuScanned(SkuScanned),
    PickCompleted(PickCompleted),
    Shipped(OutboundShipped),
    Cancelled(OutboundCancelled),
}

impl Event for OutboundEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OutboundEvent::Created(_) => "outbound.order.created",
            OutboundEvent::PickStarted(_) => "outbound.order.pick_started",
            OutboundEvent::SkuScanned(_) => "outbound.order.sku_scanned",
            OutboundEvent::PickCompleted(_) => "outbound.order.picked",
            OutboundEvent::Shipped(_) => "outbound.order.shipped",
            OutboundEvent::Cancelled(_) => "outbound.order.cancelled",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OutboundEvent::Created(e) => e.occurred_at,
            OutboundEvent::PickStarted(e) => e.occurred_at,
            OutboundEvent::SkuScanned(e) => e.occurred_at,
            OutboundEvent::PickCompleted(e) => e.occurred_at,
            OutboundEvent::Shipped(e) => e.occurred_at,
            OutboundEvent::Cancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for OutboundOrder {
    type Command = OutboundCommand;
    type Event = OutboundEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OutboundEvent::Created(e) => {
                self.id = e.order_id;
                self.warehouse_id = Some(e.warehouse_id);
                self.status = OutboundStatus::Created;
                self.items = e.items.clone();
                self.total_quantity = e.total_quantity;
                self.created_by = e.created_by.clone();
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            OutboundEvent::PickStarted(_) => {
                self.status = OutboundStatus::Picking;
            }
            OutboundEvent::SkuScanned(e) => {
                if let Some(line) = self.items.iter_mut().find(|l| l.sku == e.sku) {
                    line.scanned = true;
                }
            }
            OutboundEvent::PickCompleted(e) => {
                self.status = OutboundStatus::Picked;
                self.picked_at = Some(e.occurred_at);
            }
            OutboundEvent::Shipped(e) => {
                self.status = OutboundStatus::Shipped;
                self.shipped_at = Some(e.occurred_at);
            }
            OutboundEvent::Cancelled(e) => {
                self.status = OutboundStatus::Cancelled;
                self.cancelled_at = Some(e.occurred_at);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OutboundCommand::Create(cmd) => self.handle_create(cmd),
            OutboundCommand::StartPick(cmd) => self.handle_start_pick(cmd),
            OutboundCommand::ConfirmPick(cmd) => self.handle_confirm_pick(cmd),
            OutboundCommand::Ship(cmd) => self.handle_ship(cmd),
            OutboundCommand::Cancel(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl OutboundOrder {
    fn ensure_exists(&self) -> Result<WarehouseId, DomainError> {
        match (self.created, self.warehouse_id) {
            (true, Some(w)) => Ok(w),
            _ => Err(DomainError::not_found(format!("outbound order {}", self.id))),
        }
    }

    fn ensure_order_id(&self, order_id: OutboundOrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_transition(&self, next: OutboundStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_state(format!(
                "outbound order {} is {}, cannot become {}",
                self.id,
                self.status.as_str(),
                next.as_str()
            )));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateOutbound) -> Result<Vec<OutboundEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("outbound order already exists"));
        }
        self.ensure_order_id(cmd.order_id)?;
        if cmd.items.is_empty() {
            return Err(DomainError::validation("items cannot be empty"));
        }

        let total = total_quantity(&cmd.items)?;
        let items = cmd
            .items
            .iter()
            .cloned()
            .map(|mut l| {
                l.scanned = false;
                l
            })
            .collect();

        Ok(vec![OutboundEvent::Created(OutboundCreated {
            order_id: cmd.order_id,
            warehouse_id: cmd.warehouse_id,
            items,
            total_quantity: total,
            created_by: cmd.created_by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_start_pick(&self, cmd: &StartPick) -> Result<Vec<OutboundEvent>, DomainError> {
        let warehouse_id = self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;
        self.ensure_transition(OutboundStatus::Picking)?;

        Ok(vec![OutboundEvent::PickStarted(PickStarted {
            order_id: cmd.order_id,
            warehouse_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    /// Re-scanning an already scanned sku yields no events.
    fn handle_confirm_pick(&self, cmd: &ConfirmPick) -> Result<Vec<OutboundEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;

        if self.status != OutboundStatus::Picking {
            return Err(DomainError::invalid_state(format!(
                "outbound order {} is {}, scanning requires PICKING",
                self.id,
                self.status.as_str()
            )));
        }

        let line = self
            .items
            .iter()
            .find(|l| l.sku == cmd.sku)
            .ok_or_else(|| {
                DomainError::validation(format!("sku {} is not on outbound order {}", cmd.sku, self.id))
            })?;
        if line.scanned {
            return Ok(Vec::new());
        }

        let mut events = vec![OutboundEvent::SkuScanned(SkuScanned {
            order_id: cmd.order_id,
            sku: cmd.sku.clone(),
            occurred_at: cmd.occurred_at,
        })];

        let remaining = self.items.iter().filter(|l| !l.scanned).count();
        if remaining == 1 {
            events.push(OutboundEvent::PickCompleted(PickCompleted {
                order_id: cmd.order_id,
                occurred_at: cmd.occurred_at,
            }));
        }
        Ok(events)
    }

    fn handle_ship(&self, cmd: &ShipOutbound) -> Result<Vec<OutboundEvent>, DomainError> {
        let warehouse_id = self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;
        self.ensure_transition(OutboundStatus::Shipped)?;

        Ok(vec![OutboundEvent::Shipped(OutboundShipped {
            order_id: cmd.order_id,
            warehouse_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelOutbound) -> Result<Vec<OutboundEvent>, DomainError> {
        let warehouse_id = self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;
        self.ensure_transition(OutboundStatus::Cancelled)?;

        Ok(vec![OutboundEvent::Cancelled(OutboundCancelled {
            order_id: cmd.order_id,
            warehouse_id,
            released_stock: self.status.holds_reservation(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
