//! Warehouses and locations (read-only reference data).

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::get,
    Router,
};

use stockyard_auth::WarehouseScope;
use stockyard_core::LocationId;

use crate::app::dto::WarehouseQuery;
use crate::app::errors::ApiResult;
use crate::app::extract::ApiQuery;
use crate::app::response;
use crate::app::routes::common::{authorize_filter, parse_id};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/warehouses", get(list_warehouses))
        .route("/locations", get(list_locations))
        .route("/locations/:id", get(get_location))
}

pub async fn list_warehouses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
) -> ApiResult {
    let mut warehouses = services.core().directory.list_warehouses();
    warehouses.retain(|w| scope.allows(w.id));
    Ok(response::ok(warehouses))
}

pub async fn list_locations(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    ApiQuery(q): ApiQuery<WarehouseQuery>,
) -> ApiResult {
    authorize_filter(&scope, q.warehouse_id)?;
    let mut locations = services.core().directory.list_locations(q.warehouse_id);
    locations.retain(|l| scope.allows(l.warehouse_id));
    Ok(response::ok(locations))
}

pub async fn get_location(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: LocationId = parse_id(&id)?;
    let location = services.core().directory.get_location(id)?;
    scope.authorize_warehouse(location.warehouse_id)?;
    Ok(response::ok(location))
}
