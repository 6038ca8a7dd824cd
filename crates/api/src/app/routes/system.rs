use std::sync::Arc;

use axum::{
    extract::Extension,
    response::{sse::Event as SseEvent, Response},
};
use serde_json::json;

use stockyard_auth::WarehouseScope;

use crate::app::dto;
use crate::app::response;
use crate::app::services::{self, AppServices};
use crate::context::PrincipalContext;

pub async fn health() -> Response {
    response::ok(json!({ "status": "ok" }))
}

pub async fn whoami(
    Extension(scope): Extension<WarehouseScope>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    response::ok(dto::WhoAmI {
        principal_id: principal.principal_id().to_string(),
        roles: principal.roles().iter().map(|r| r.as_str().to_string()).collect(),
        scope,
    })
}

pub async fn stream(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(scope): Extension<WarehouseScope>,
) -> axum::response::Sse<impl tokio_stream::Stream<Item = Result<SseEvent, std::convert::Infallible>>> {
    services::warehouse_sse_stream(services, scope)
}
