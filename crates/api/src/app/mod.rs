//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: in-process services plus the SSE broadcast forwarder
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and domain mapping
//! - `errors.rs` / `response.rs`: the `{code, message, data}` envelope
//! - `extract.rs`: JSON/query extractors that reject with the envelope

use std::sync::Arc;

use axum::{routing::get, Extension, Router};

use stockyard_auth::Hs256JwtValidator;
use stockyard_core::DomainResult;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod response;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(config: &AppConfig) -> DomainResult<Router> {
    let jwt = Arc::new(Hs256JwtValidator::new(config.jwt_secret.clone().into_bytes()));
    let auth_state = middleware::AuthState { jwt };

    let services = Arc::new(services::build_services(config)?);

    // Protected routes: require a valid token; handlers enforce warehouse scope.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .fallback(not_found))
}

async fn not_found() -> errors::ApiError {
    errors::ApiError::new(axum::http::StatusCode::NOT_FOUND, "NOT_FOUND", "no such route")
}
