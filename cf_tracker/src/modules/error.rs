use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cf_tracker_libs::{store::StoreError, MessageResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input the caller can fix.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    AlreadyExists(String),
    /// The judge rejected or could not confirm the handle or problem.
    #[error("{0}")]
    Upstream(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::AlreadyExists(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::AlreadyExists { kind: "handle", .. } => {
                ApiError::AlreadyExists(String::from("Handle already exists"))
            }
            StoreError::AlreadyExists { kind: "problem", .. } => {
                ApiError::AlreadyExists(String::from("Problem already exists"))
            }
            StoreError::AlreadyExists { kind, key } => {
                ApiError::AlreadyExists(format!("{} {} already exists", kind, key))
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!("internal error: {}", detail);
        }

        (self.code(), Json(MessageResponse::new(self))).into_response()
    }
}
