use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockyard_core::{Aggregate, AggregateRoot, DomainError, InboundOrderId, Money, WarehouseId};
use stockyard_events::Event;

use crate::line::{InboundLine, totals};

/// Inbound order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundStatus {
    Created,
    Confirmed,
}

impl InboundStatus {
    /// Exhaustive transition table.
    pub fn can_transition_to(self, next: InboundStatus) -> bool {
        match (self, next) {
            (InboundStatus::Created, InboundStatus::Confirmed) => true,
            (InboundStatus::Created, InboundStatus::Created)
            | (InboundStatus::Confirmed, InboundStatus::Created)
            | (InboundStatus::Confirmed, InboundStatus::Confirmed) => false,
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, InboundStatus::Created)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InboundStatus::Created => "CREATED",
            InboundStatus::Confirmed => "CONFIRMED",
        }
    }
}

impl core::str::FromStr for InboundStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Ok(InboundStatus::Created),
            "CONFIRMED" => Ok(InboundStatus::Confirmed),
            other => Err(DomainError::validation(format!("unknown inbound status {other:?}"))),
        }
    }
}

/// Aggregate root: InboundOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundOrder {
    id: InboundOrderId,
    warehouse_id: Option<WarehouseId>,
    status: InboundStatus,
    items: Vec<InboundLine>,
    total_quantity: i64,
    total_amount: Money,
    created_by: Option<String>,
    created_at: Option<DateTime<Utc>>,
    confirmed_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl InboundOrder {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: InboundOrderId) -> Self {
        Self {
            id,
            warehouse_id: None,
            status: InboundStatus::Created,
            items: Vec::new(),
            total_quantity: 0,
            total_amount: Money::ZERO,
            created_by: None,
            created_at: None,
            confirmed_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InboundOrderId {
        self.id
    }

    pub fn warehouse_id(&self) -> Option<WarehouseId> {
        self.warehouse_id
    }

    pub fn status(&self) -> InboundStatus {
        self.status
    }

    pub fn items(&self) -> &[InboundLine] {
        &self.items
    }

    pub fn total_quantity(&self) -> i64 {
        self.total_quantity
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for InboundOrder {
    type Id = InboundOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateInbound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateInbound {
    pub order_id: InboundOrderId,
    pub warehouse_id: WarehouseId,
    pub items: Vec<InboundLine>,
    pub created_by: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReplaceInboundItems (only while Created).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceInboundItems {
    pub order_id: InboundOrderId,
    pub items: Vec<InboundLine>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmInbound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmInbound {
    pub order_id: InboundOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboundCommand {
    Create(CreateInbound),
    ReplaceItems(ReplaceInboundItems),
    Confirm(ConfirmInbound),
}

/// Event: InboundCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundCreated {
    pub order_id: InboundOrderId,
    pub warehouse_id: WarehouseId,
    pub items: Vec<InboundLine>,
    pub total_quantity: i64,
    pub total_amount: Money,
    pub created_by: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InboundItemsReplaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundItemsReplaced {
    pub order_id: InboundOrderId,
    pub items: Vec<InboundLine>,
    pub total_quantity: i64,
    pub total_amount: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: InboundConfirmed. Stock for every line has been received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundConfirmed {
    pub order_id: InboundOrderId,
    pub warehouse_id: WarehouseId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum InboundEvent {
    Created(InboundCreated),
    ItemsReplaced(InboundItemsReplaced),
    Confirmed(InboundConfirmed),
}

impl Event for InboundEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InboundEvent::Created(_) => "inbound.order.created",
            InboundEvent::ItemsReplaced(_) => "inbound.order.items_replaced",
            InboundEvent::Confirmed(_) => "inbound.order.confirmed",
        }
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InboundEvent::Created(e) => e.occurred_at,
            InboundEvent::ItemsReplaced(e) => e.occurred_at,
            InboundEvent::Confirmed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InboundOrder {
    type Command = InboundCommand;
    type Event = InboundEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InboundEvent::Created(e) => {
                self.id = e.order_id;
                self.warehouse_id = Some(e.warehouse_id);
                self.status = InboundStatus::Created;
                self.items = e.items.clone();
                self.total_quantity = e.total_quantity;
                self.total_amount = e.total_amount;
                self.created_by = e.created_by.clone();
                self.created_at = Some(e.occurred_at);
                self.created = true;
            }
            InboundEvent::ItemsReplaced(e) => {
                self.items = e.items.clone();
                self.total_quantity = e.total_quantity;
                self.total_amount = e.total_amount;
            }
            InboundEvent::Confirmed(e) => {
                self.status = InboundStatus::Confirmed;
                self.confirmed_at = Some(e.occurred_at);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InboundCommand::Create(cmd) => self.handle_create(cmd),
            InboundCommand::ReplaceItems(cmd) => self.handle_replace_items(cmd),
            InboundCommand::Confirm(cmd) => self.handle_confirm(cmd),
        }
    }
}

impl InboundOrder {
    fn ensure_exists(&self) -> Result<WarehouseId, DomainError> {
        match (self.created, self.warehouse_id) {
            (true, Some(w)) => Ok(w),
            _ => Err(DomainError::not_found(format!("inbound order {}", self.id))),
        }
    }

    fn ensure_order_id(&self, order_id: InboundOrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_transition(&self, next: InboundStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invalid_state(format!(
                "inbound order {} is {}, cannot become {}",
                self.id,
                self.status.as_str(),
                next.as_str()
            )));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateInbound) -> Result<Vec<InboundEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("inbound order already exists"));
        }
        self.ensure_order_id(cmd.order_id)?;
        if cmd.items.is_empty() {
            return Err(DomainError::validation("items cannot be empty"));
        }
        let (total_quantity, total_amount) = totals(&cmd.items)?;

        Ok(vec![InboundEvent::Created(InboundCreated {
            order_id: cmd.order_id,
            warehouse_id: cmd.warehouse_id,
            items: cmd.items.clone(),
            total_quantity,
            total_amount,
            created_by: cmd.created_by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_replace_items(
        &self,
        cmd: &ReplaceInboundItems,
    ) -> Result<Vec<InboundEvent>, DomainError> {
        self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;

        if !self.status.is_open() {
            return Err(DomainError::invalid_state(format!(
                "inbound order {} is {}, items can only change while CREATED",
                self.id,
                self.status.as_str()
            )));
        }
        if cmd.items.is_empty() {
            return Err(DomainError::validation("items cannot be empty"));
        }
        let (total_quantity, total_amount) = totals(&cmd.items)?;

        Ok(vec![InboundEvent::ItemsReplaced(InboundItemsReplaced {
            order_id: cmd.order_id,
            items: cmd.items.clone(),
            total_quantity,
            total_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_confirm(&self, cmd: &ConfirmInbound) -> Result<Vec<InboundEvent>, DomainError> {
        let warehouse_id = self.ensure_exists()?;
        self.ensure_order_id(cmd.order_id)?;
        self.ensure_transition(InboundStatus::Confirmed)?;

        Ok(vec![InboundEvent::Confirmed(InboundConfirmed {
            order_id: cmd.order_id,
            warehouse_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
