//! Service-level errors and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::db::StoreError;
use crate::metrics::API_ERRORS;

/// Errors returned by the admin and user services
#[derive(Debug, Error, PartialEq)]
pub enum AppError {
    /// Malformed input or a business rule violation (400)
    #[error("{0}")]
    Validation(String),

    /// A referenced entity does not exist (404)
    #[error("{0}")]
    NotFound(String),

    /// Store failure or unexpected response (500)
    #[error("{0}")]
    Server(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    /// Log a store failure with its context and hide it behind a generic message
    pub fn server(context: &str, err: StoreError) -> Self {
        tracing::error!(error = %err, "{}", context);
        match err {
            StoreError::Malformed(_) => AppError::Server("Invalid server response".to_string()),
            _ => AppError::Server(context.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Server(_) => "server",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        API_ERRORS.with_label_values(&[self.kind()]).inc();

        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (self.status(), body).into_response()
    }
}
