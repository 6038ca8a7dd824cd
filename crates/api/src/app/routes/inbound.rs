use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::{get, put},
    Router,
};

use stockyard_auth::WarehouseScope;
use stockyard_core::InboundOrderId;
use stockyard_inbound::InboundStatus;

use crate::app::dto::{
    ConfirmInboundResponse, CreateInboundRequest, InboundOrderView, OrderListQuery, ReplaceItemsRequest,
};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::response;
use crate::app::routes::common::{authorize_filter, authorize_order, parse_id};
use crate::app::services::{blocking, AppServices};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/inbound", get(list_inbound).post(create_inbound))
        .route("/inbound/:id", get(get_inbound).put(replace_items))
        .route("/inbound/:id/confirm", put(confirm_inbound))
}

/// Load the order and check it is in scope before acting on it.
async fn scoped_order_id(
    services: &Arc<AppServices>,
    scope: &WarehouseScope,
    raw_id: &str,
) -> Result<InboundOrderId, ApiError> {
    let id: InboundOrderId = parse_id(raw_id)?;
    let s = services.clone();
    let order = blocking(move || s.core().inbound.get(id)).await?;
    authorize_order(scope, order.warehouse_id())?;
    Ok(id)
}

pub async fn create_inbound(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<CreateInboundRequest>,
) -> ApiResult {
    scope.authorize_warehouse(body.warehouse_id)?;
    let operator = principal.operator();
    let order = blocking(move || {
        services
            .core()
            .inbound
            .create(body.warehouse_id, &body.items, Some(operator))
    })
    .await?;
    Ok(response::created(InboundOrderView::new(&order)?))
}

pub async fn list_inbound(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    ApiQuery(q): ApiQuery<OrderListQuery>,
) -> ApiResult {
    authorize_filter(&scope, q.warehouse_id)?;
    let filter = q.to_filter::<InboundStatus>()?;
    let mut orders = blocking(move || services.core().reporting.list_inbound(&filter)).await?;
    orders.retain(|o| scope.allows_opt(o.warehouse_id()));
    Ok(response::ok(InboundOrderView::many(&orders)?))
}

pub async fn get_inbound(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: InboundOrderId = parse_id(&id)?;
    let order = blocking(move || services.core().inbound.get(id)).await?;
    authorize_order(&scope, order.warehouse_id())?;
    Ok(response::ok(InboundOrderView::new(&order)?))
}

pub async fn replace_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReplaceItemsRequest>,
) -> ApiResult {
    let id = scoped_order_id(&services, &scope, &id).await?;
    let order = blocking(move || services.core().inbound.replace_items(id, &body.items)).await?;
    Ok(response::ok(InboundOrderView::new(&order)?))
}

pub async fn confirm_inbound(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = scoped_order_id(&services, &scope, &id).await?;
    let operator = principal.operator();
    let outcome = blocking(move || services.core().inbound.confirm(id, Some(operator))).await?;
    Ok(response::ok(ConfirmInboundResponse {
        order: InboundOrderView::new(&outcome.order)?,
        newly_confirmed: outcome.newly_confirmed,
    }))
}
