//! HTTP mapping for the domain error taxonomy. `DuplicateSummary` never
//! reaches this layer in practice — the summary service recovers it by
//! re-reading — but it gets a conflict mapping anyway rather than a panic
//! path.

use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use agora_core::error::AppError;

#[derive(Debug)]
pub struct ApiError(pub AppError);

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::InvalidParent(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
            AppError::ThreadLocked(_)
            | AppError::AlreadyResolved(_)
            | AppError::EmailTaken(_)
            | AppError::DuplicateSummary
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::SummarizerFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.0.to_string() }))
    }
}
