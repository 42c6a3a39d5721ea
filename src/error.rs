use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::Record;
use crate::repository::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    /// `message` is what the client sees; `source` only goes to the log.
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Maps a store failure for resource `T`; `failure` is the generic text
    /// returned if the store itself broke.
    pub fn from_store<T: Record>(err: StoreError, failure: String) -> Self {
        match err {
            StoreError::Validation(e) => AppError::Validation(e.0.to_string()),
            StoreError::NotFound => AppError::NotFound(T::NAME),
            StoreError::Backend(source) => AppError::Internal {
                message: failure,
                source,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal { message, source } = &self {
            tracing::error!(error = ?source, "{}", message);
        }
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
