pub mod dashboard;
pub mod handle;
pub mod problem;

use crate::modules::error::ApiError;
use axum::http::StatusCode;

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Bare `OPTIONS` requests; CORS preflights are answered by the CORS layer before reaching here.
pub async fn options() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound(String::from("Not found"))
}
