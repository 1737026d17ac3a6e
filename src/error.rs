use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    Authentication(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Status for errors the handlers answer themselves. Faults return `None`
    /// and are left to the hosting adapter.
    pub fn client_status(&self) -> Option<StatusCode> {
        match self {
            AppError::Validation(_) => Some(StatusCode::BAD_REQUEST),
            AppError::Conflict(_) => Some(StatusCode::CONFLICT),
            AppError::Authentication(_) => Some(StatusCode::UNAUTHORIZED),
            AppError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            AppError::MethodNotAllowed => Some(StatusCode::METHOD_NOT_ALLOWED),
            AppError::MalformedBody(_) | AppError::Database(_) | AppError::Internal(_) => None,
        }
    }
}

/// What the hosting adapter answers when a handler returns `Err`. Handlers
/// never return business errors this way, so every error here is a fault.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "unhandled fault");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response()
    }
}
