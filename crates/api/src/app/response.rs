//! `{code, message, data}` envelope used by every JSON response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub code: &'static str,
    pub message: String,
    pub data: T,
}

fn envelope<T: Serialize>(status: StatusCode, data: T) -> Response {
    let body = Envelope {
        code: "OK",
        message: "success".to_string(),
        data,
    };
    (status, axum::Json(body)).into_response()
}

pub fn ok<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::OK, data)
}

pub fn created<T: Serialize>(data: T) -> Response {
    envelope(StatusCode::CREATED, data)
}
