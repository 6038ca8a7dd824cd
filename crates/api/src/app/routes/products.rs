//! Product catalog. Products are global; no warehouse scope applies.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::get,
    Router,
};

use stockyard_core::ProductId;
use stockyard_directory::{NewProduct, ProductPatch};

use crate::app::dto::ProductListQuery;
use crate::app::errors::ApiResult;
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::response;
use crate::app::routes::common::parse_id;
use crate::app::services::{blocking, AppServices};

pub fn router() -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(q): ApiQuery<ProductListQuery>,
) -> ApiResult {
    let (query, page) = q.split()?;
    Ok(response::ok(services.core().directory.list_products(&query, page)))
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: ProductId = parse_id(&id)?;
    Ok(response::ok(services.core().directory.get_product(id)?))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<NewProduct>,
) -> ApiResult {
    let product = services.core().directory.create_product(body)?;
    tracing::info!(product_id = %product.id, sku = %product.sku, "product created");
    Ok(response::created(product))
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> ApiResult {
    let id: ProductId = parse_id(&id)?;
    Ok(response::ok(services.core().directory.update_product(id, patch)?))
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult {
    let id: ProductId = parse_id(&id)?;
    let product = blocking(move || services.core().reporting.delete_product(id)).await?;
    Ok(response::ok(product))
}
