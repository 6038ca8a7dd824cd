//! Inventory views plus the two inventory writes exposed over HTTP.
//!
//! Requests without `warehouse_id` are answered for every warehouse in the
//! caller's scope.

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, post, put},
    Router,
};

use stockyard_auth::WarehouseScope;
use stockyard_core::DomainError;
use stockyard_infra::InventorySummary;
use stockyard_inventory::MovementQuery;

use crate::app::dto::{InventoryQuery, StocktakeRequest, StocktakeResponse, WarehouseQuery, WarningThresholdRequest};
use crate::app::errors::ApiResult;
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::response;
use crate::app::routes::common::authorize_filter;
use crate::app::services::{blocking, AppServices};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/inventory", get(list_inventory))
        .route("/inventory/warnings", get(list_warnings))
        .route("/inventory/summary", get(summary))
        .route("/inventory/movements", get(movements))
        .route("/inventory/shipped-totals", get(shipped_totals))
        .route("/inventory/warning-threshold", put(set_warning_threshold))
        .route("/inventory/stocktake", post(submit_stocktake))
        .route("/inventory/stocktakes", get(list_stocktakes))
}

pub async fn list_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    ApiQuery(q): ApiQuery<InventoryQuery>,
) -> ApiResult {
    authorize_filter(&scope, q.warehouse_id)?;
    let mut records = blocking(move || {
        services
            .core()
            .reporting
            .list_inventory(q.warehouse_id, q.sku.as_deref())
    })
    .await?;
    records.retain(|r| scope.allows(r.warehouse_id));
    Ok(response::ok(records))
}

pub async fn list_warnings(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    ApiQuery(q): ApiQuery<WarehouseQuery>,
) -> ApiResult {
    authorize_filter(&scope, q.warehouse_id)?;
    let mut records = blocking(move || services.core().reporting.low_stock(q.warehouse_id)).await?;
    records.retain(|r| scope.allows(r.warehouse_id));
    Ok(response::ok(records))
}

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    ApiQuery(q): ApiQuery<WarehouseQuery>,
) -> ApiResult {
    authorize_filter(&scope, q.warehouse_id)?;
    let summary = blocking(move || {
        let core = services.core();
        if q.warehouse_id.is_some() || scope == WarehouseScope::All {
            return core.reporting.inventory_summary(q.warehouse_id);
        }
        let mut total = InventorySummary::default();
        for w in core.directory.list_warehouses().into_iter().filter(|w| scope.allows(w.id)) {
            let s = core.reporting.inventory_summary(Some(w.id))?;
            total.records += s.records;
            total.total_available = total.total_available.saturating_add(s.total_available);
            total.total_locked = total.total_locked.saturating_add(s.total_locked);
            total.warnings += s.warnings;
        }
        Ok(total)
    })
    .await?;
    Ok(response::ok(summary))
}

pub async fn movements(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    ApiQuery(mut q): ApiQuery<MovementQuery>,
) -> ApiResult {
    authorize_filter(&scope, q.warehouse_id)?;
    // Filter by scope before applying the limit.
    let limit = q.limit.take();
    let mut entries = services.core().reporting.movements(&q);
    entries.retain(|m| scope.allows(m.warehouse_id));
    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
    }
    Ok(response::ok(entries))
}

pub async fn shipped_totals(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    ApiQuery(q): ApiQuery<WarehouseQuery>,
) -> ApiResult {
    authorize_filter(&scope, q.warehouse_id)?;
    if q.warehouse_id.is_none() && scope != WarehouseScope::All {
        // Totals aggregate across warehouses; restricted callers must name one.
        return Err(DomainError::validation("warehouse_id is required for callers limited to specific warehouses").into());
    }
    Ok(response::ok(services.core().reporting.shipped_totals(q.warehouse_id)))
}

pub async fn set_warning_threshold(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<WarningThresholdRequest>,
) -> ApiResult {
    scope.authorize_warehouse(body.warehouse_id)?;
    let operator = principal.operator();
    let record = blocking(move || {
        services.core().reporting.set_threshold(
            body.warehouse_id,
            &body.sku,
            &body.warning_threshold,
            Some(operator),
        )
    })
    .await?;
    Ok(response::ok(record))
}

pub async fn submit_stocktake(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Extension(principal): Extension<PrincipalContext>,
    ApiJson(body): ApiJson<StocktakeRequest>,
) -> ApiResult {
    scope.authorize_warehouse(body.warehouse_id)?;
    let operator = principal.operator();
    let (stocktake, records) = blocking(move || {
        services
            .core()
            .reporting
            .submit_stocktake(body.warehouse_id, &body.entries, Some(operator))
    })
    .await?;
    Ok(response::ok(StocktakeResponse { stocktake, records }))
}

pub async fn list_stocktakes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    ApiQuery(q): ApiQuery<WarehouseQuery>,
) -> ApiResult {
    authorize_filter(&scope, q.warehouse_id)?;
    let mut stocktakes = services.core().reporting.list_stocktakes(q.warehouse_id);
    stocktakes.retain(|s| scope.allows(s.warehouse_id));
    Ok(response::ok(stocktakes))
}
