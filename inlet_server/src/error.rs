use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use inlet_core::error as core_error;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("missing x-customer-id header")]
    MissingCustomerId,

    #[error("invalid x-customer-id header: {0}")]
    InvalidCustomerId(String),

    #[error("{0}")]
    Core(#[from] inlet_core::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            // Customer identity is the request's authentication.
            ApiError::MissingCustomerId | ApiError::InvalidCustomerId(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Core(err) => match err {
                core_error::Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
                core_error::Error::NotFound(_) => StatusCode::NOT_FOUND,
                core_error::Error::Conflict(_) => StatusCode::CONFLICT,
                core_error::Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                core_error::Error::Backend { .. } | core_error::Error::BackendMessage(_) => {
                    StatusCode::BAD_GATEWAY
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (code, Json(body)).into_response()
    }
}
