//! HTTP API surfaces.
//!
//! - `webhook` - SePay transaction deliveries
//! - `user`    - deposit lifecycle, wallet reads and API tokens (bearer auth)
//! - `admin`   - listings and manual reconciliation (admin secret)

pub mod admin;
pub mod extractors;
pub mod user;
pub mod webhook;

use autopee_sdk::objects::ErrorBody;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

/// JSON error response with a stable machine-readable code.
pub(crate) fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    (status, Json(ErrorBody::new(code, message))).into_response()
}

/// Log `error` under a fresh trace id and return an opaque 500 carrying it.
pub(crate) fn internal_error(surface: &str, error: &dyn std::fmt::Display) -> Response {
    let trace_id = Uuid::new_v4();
    tracing::error!(%trace_id, error = %error, "{surface} internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::internal(trace_id)),
    )
        .into_response()
}
