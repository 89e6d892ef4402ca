use crate::source::SourceError;
use thiserror::Error;

/// Errors surfaced to HTTP clients.
///
/// Messages of the client-facing variants are shown verbatim; backend
/// failures are logged and replaced with a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("template rendering failed: {0}")]
    Template(String),
}

#[cfg(feature = "web")]
mod response {
    use super::AppError;
    use axum::Json;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use serde_json::json;

    const GENERIC_ERROR: &str = "Sunucu hatası oluştu";

    impl AppError {
        pub fn status(&self) -> StatusCode {
            match self {
                AppError::NotFound(_) => StatusCode::NOT_FOUND,
                AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
                AppError::Conflict(_) => StatusCode::CONFLICT,
                AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                AppError::Source(_) | AppError::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = self.status();
            let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                log::error!("Request failed: {}", self);
                GENERIC_ERROR.to_string()
            } else {
                self.to_string()
            };
            (status, Json(json!({ "error": message }))).into_response()
        }
    }
}
