//! Request/response DTOs and mapping from domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockyard_auth::WarehouseScope;
use stockyard_core::{
    DomainError, DomainResult, InboundOrderId, NumericInput, OutboundOrderId, WarehouseId,
};
use stockyard_directory::{PageRequest, ProductQuery};
use stockyard_inbound::{InboundLineInput, InboundOrder, InboundStatus};
use stockyard_infra::{OrderFilter, ShipResult};
use stockyard_inventory::{InventoryRecord, Stocktake, StocktakeLineInput};
use stockyard_outbound::{OutboundLine, OutboundLineInput, OutboundOrder, OutboundStatus};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateInboundRequest {
    pub warehouse_id: WarehouseId,
    pub items: Vec<InboundLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceItemsRequest {
    pub items: Vec<InboundLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOutboundRequest {
    pub warehouse_id: WarehouseId,
    pub items: Vec<OutboundLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct PickRequest {
    pub sku: String,
}

#[derive(Debug, Deserialize)]
pub struct ShipManyRequest {
    pub order_ids: Vec<OutboundOrderId>,
}

#[derive(Debug, Deserialize)]
pub struct WarningThresholdRequest {
    pub warehouse_id: WarehouseId,
    pub sku: String,
    #[serde(alias = "threshold")]
    pub warning_threshold: NumericInput,
}

#[derive(Debug, Deserialize)]
pub struct StocktakeRequest {
    pub warehouse_id: WarehouseId,
    #[serde(alias = "items")]
    pub entries: Vec<StocktakeLineInput>,
}

// -------------------------
// Query DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct WarehouseQuery {
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InventoryQuery {
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    #[serde(default)]
    pub sku: Option<String>,
}

/// `status` is matched case-insensitively.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    #[serde(default)]
    pub warehouse_id: Option<WarehouseId>,
    #[serde(default)]
    pub status: Option<String>,
}

impl OrderListQuery {
    pub fn to_filter<S>(&self) -> DomainResult<OrderFilter<S>>
    where
        S: std::str::FromStr<Err = DomainError>,
    {
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<S>()?),
        };
        Ok(OrderFilter {
            warehouse_id: self.warehouse_id,
            status,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl ProductListQuery {
    pub fn split(self) -> DomainResult<(ProductQuery, PageRequest)> {
        let defaults = PageRequest::default();
        let page = PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.page_size.unwrap_or(defaults.page_size),
        )?;
        Ok((
            ProductQuery {
                q: self.q,
                category: self.category,
            },
            page,
        ))
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub principal_id: String,
    pub roles: Vec<String>,
    pub scope: WarehouseScope,
}

#[derive(Debug, Serialize)]
pub struct InboundLineView {
    pub sku: String,
    pub quantity: i64,
    pub unit_price: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct InboundOrderView {
    pub id: InboundOrderId,
    pub warehouse_id: Option<WarehouseId>,
    pub status: InboundStatus,
    pub items: Vec<InboundLineView>,
    pub total_quantity: i64,
    pub total_amount: String,
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl InboundOrderView {
    pub fn new(order: &InboundOrder) -> DomainResult<Self> {
        let items = order
            .items()
            .iter()
            .map(|l| {
                Ok(InboundLineView {
                    sku: l.sku.to_string(),
                    quantity: l.quantity.get(),
                    unit_price: l.unit_price.to_string(),
                    amount: l.amount()?.to_string(),
                })
            })
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(Self {
            id: order.id_typed(),
            warehouse_id: order.warehouse_id(),
            status: order.status(),
            items,
            total_quantity: order.total_quantity(),
            total_amount: order.total_amount().to_string(),
            created_by: order.created_by().map(str::to_string),
            created_at: order.created_at(),
            confirmed_at: order.confirmed_at(),
        })
    }

    pub fn many(orders: &[InboundOrder]) -> DomainResult<Vec<Self>> {
        orders.iter().map(Self::new).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ConfirmInboundResponse {
    #[serde(flatten)]
    pub order: InboundOrderView,
    pub newly_confirmed: bool,
}

#[derive(Debug, Serialize)]
pub struct OutboundOrderView {
    pub id: OutboundOrderId,
    pub warehouse_id: Option<WarehouseId>,
    pub status: OutboundStatus,
    pub items: Vec<OutboundLine>,
    pub total_quantity: i64,
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub picked_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<&OutboundOrder> for OutboundOrderView {
    fn from(order: &OutboundOrder) -> Self {
        Self {
            id: order.id_typed(),
            warehouse_id: order.warehouse_id(),
            status: order.status(),
            items: order.items().to_vec(),
            total_quantity: order.total_quantity(),
            created_by: order.created_by().map(str::to_string),
            created_at: order.created_at(),
            picked_at: order.picked_at(),
            shipped_at: order.shipped_at(),
            cancelled_at: order.cancelled_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// One entry of a batch ship response; exactly one of `order`/`error` is set.
#[derive(Debug, Serialize)]
pub struct ShipResultView {
    pub order_id: OutboundOrderId,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OutboundOrderView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl From<&ShipResult> for ShipResultView {
    fn from(r: &ShipResult) -> Self {
        match &r.result {
            Ok(order) => Self {
                order_id: r.order_id,
                ok: true,
                order: Some(order.into()),
                error: None,
            },
            Err(e) => Self {
                order_id: r.order_id,
                ok: false,
                order: None,
                error: Some(ErrorBody {
                    code: e.code(),
                    message: e.to_string(),
                }),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StocktakeResponse {
    pub stocktake: Stocktake,
    pub records: Vec<InventoryRecord>,
}
