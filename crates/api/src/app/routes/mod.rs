use axum::{routing::get, Router};

pub mod common;
pub mod directory;
pub mod inbound;
pub mod inventory;
pub mod outbound;
pub mod products;
pub mod system;

/// Router for all authenticated (warehouse-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .merge(directory::router())
        .merge(products::router())
        .merge(inbound::router())
        .merge(outbound::router())
        .merge(inventory::router())
}
