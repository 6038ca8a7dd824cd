use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};

use stockyard_auth::{AuthzError, WarehouseScope};
use stockyard_core::{DomainError, OutboundOrderId};
use stockyard_outbound::{OutboundOrder, OutboundStatus};

use crate::app::dto::{
    CreateOutboundRequest, OrderListQuery, OutboundOrderView, PickRequest, ShipManyRequest, ShipResultView,
};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::response;
use crate::app::routes::common::{authorize_filter, authorize_order, parse_id};
use crate::app::services::{blocking, AppServices};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/outbound", get(list_outbound).post(create_outbound))
        .route("/outbound/ship", post(ship_many))
        .route("/outbound/:id", get(get_outbound).delete(delete_outbound))
        .route("/outbound/:id/start-pick", put(start_pick))
        .route("/outbound/:id/pick", put(confirm_pick))
        .route("/outbound/:id/ship", put(ship))
        .route("/outbound/:id/cancel", put(cancel))
}

async fn scoped_order_id(
    services: &Arc<AppServices>,
    scope: &WarehouseScope,
    raw_id: &str,
) -> Result<OutboundOrderId, ApiError> {
    let id: OutboundOrderId = parse_id(raw_id)?;
    let s = services.clone();
    let order = blocking(move || s.core().outbound.get(id)).await?;
    authorize_order(scope, order.warehouse_id())?;
    Ok(id)
}

fn view(order: &OutboundOrder) -> axum::response::Response {
    response::ok(OutboundOrderView::from(order))
}

pub async fn create_outbound(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<CreateOutboundRequest>,
) -> ApiResult {
    scope.authorize_warehouse(body.warehouse_id)?;
    let operator = principal.operator();
    let order = blocking(move || {
        services
            .core()
            .outbound
            .create(body.warehouse_id, &body.items, Some(operator))
    })
    .await?;
    Ok(response::created(OutboundOrderView::from(&order)))
}

pub async fn list_outbound(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    ApiQuery(q): ApiQuery<OrderListQuery>,
) -> ApiResult {
    authorize_filter(&scope, q.warehouse_id)?;
    let filter = q.to_filter::<OutboundStatus>()?;
    let mut orders = blocking(move || services.core().reporting.list_outbound(&filter)).await?;
    orders.retain(|o| scope.allows_opt(o.warehouse_id()));
    let views: Vec<OutboundOrderView> = orders.iter().map(OutboundOrderView::from).collect();
    Ok(response::ok(views))
}

pub async fn get_outbound(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: OutboundOrderId = parse_id(&id)?;
    let order = blocking(move || services.core().outbound.get(id)).await?;
    authorize_order(&scope, order.warehouse_id())?;
    Ok(view(&order))
}

pub async fn start_pick(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = scoped_order_id(&services, &scope, &id).await?;
    let operator = principal.operator();
    let order = blocking(move || services.core().outbound.start_pick(id, Some(operator))).await?;
    Ok(view(&order))
}

pub async fn confirm_pick(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<PickRequest>,
) -> ApiResult {
    let id = scoped_order_id(&services, &scope, &id).await?;
    let order = blocking(move || services.core().outbound.confirm_pick(id, &body.sku)).await?;
    Ok(view(&order))
}

pub async fn ship(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = scoped_order_id(&services, &scope, &id).await?;
    let operator = principal.operator();
    let order = blocking(move || services.core().outbound.ship(id, Some(operator))).await?;
    Ok(view(&order))
}

pub async fn cancel(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = scoped_order_id(&services, &scope, &id).await?;
    let operator = principal.operator();
    let order = blocking(move || services.core().outbound.cancel(id, Some(operator))).await?;
    Ok(view(&order))
}

/// Ship several orders; one result per id, in request order.
///
/// Every known order must be in scope or the whole request is rejected.
/// Unknown ids come back as per-id `NOT_FOUND` results.
pub async fn ship_many(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<ShipManyRequest>,
) -> ApiResult {
    if body.order_ids.is_empty() {
        return Err(DomainError::validation("order_ids cannot be empty").into());
    }
    let operator = principal.operator();
    let results = blocking(move || {
        let outbound = &services.core().outbound;
        for id in &body.order_ids {
            match outbound.get(*id) {
                Ok(order) => {
                    if let Some(w) = order.warehouse_id().filter(|w| !scope.allows(*w)) {
                        return Ok(Err(w));
                    }
                }
                Err(DomainError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(Ok(outbound.ship_many(&body.order_ids, Some(operator))))
    })
    .await?;

    let results = match results {
        Ok(r) => r,
        Err(w) => return Err(AuthzError::WarehouseOutOfScope(w).into()),
    };
    let views: Vec<ShipResultView> = results.iter().map(ShipResultView::from).collect();
    Ok(response::ok(views))
}

pub async fn delete_outbound(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Path(id): Path<String>,
) -> ApiResult {
    let id = scoped_order_id(&services, &scope, &id).await?;
    blocking(move || services.core().outbound.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
