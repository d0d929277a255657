use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use corral_domain::DomainError;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Query failed: {0}")]
    Domain(#[from] DomainError),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Domain(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::Domain(_) => "STORE_ERROR",
        }
    }
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Domain(e) => error!(error = %e, "Query request failed"),
            Self::BadRequest { message } => warn!(message = %message, "Rejected query request"),
        }

        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
        };

        (self.status_code(), Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
