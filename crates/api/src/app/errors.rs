//! The single place where failures become HTTP responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use stockyard_auth::AuthzError;
use stockyard_core::DomainError;

use crate::app::response::Envelope;

pub type ApiResult = Result<Response, ApiError>;

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    data: Value,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            data: json!({ "retryable": false }),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::InvalidState(_)
        | DomainError::InsufficientStock(_)
        | DomainError::StocktakeBelowLocked { .. }
        | DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Busy(_) => StatusCode::SERVICE_UNAVAILABLE,
        DomainError::InvariantViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let status = status_for(&err);
        let mut data = json!({ "retryable": err.is_retryable() });
        match &err {
            DomainError::InsufficientStock(shortages) => {
                data["shortages"] = json!(shortages);
            }
            DomainError::StocktakeBelowLocked { sku, counted, locked } => {
                data["sku"] = json!(sku);
                data["counted"] = json!(counted);
                data["locked"] = json!(locked);
            }
            DomainError::InvariantViolation(msg) => {
                tracing::error!(error = %msg, "invariant violation reached the api");
            }
            _ => {}
        }
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
            data,
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            rejection.body_text(),
        )
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "VALIDATION_ERROR",
            rejection.body_text(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::warn!(code = self.code, status = self.status.as_u16(), message = %self.message, "request failed");
        }
        let body = Envelope {
            code: self.code,
            message: self.message,
            data: self.data,
        };
        (self.status, axum::Json(body)).into_response()
    }
}
