//! API error types.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use qledger_engine::LedgerError;
use qledger_models::DenialReason;
use qledger_store::StoreError;

use crate::config::running_in_production;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("{0}")]
    Denied(DenialReason),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotAllowed(reason) => ApiError::Denied(reason),
        }
    }
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Denied(DenialReason::InsufficientCredits { .. }) => StatusCode::PAYMENT_REQUIRED,
            ApiError::Denied(DenialReason::ImageLimitExceeded { .. }) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> Option<&'static str> {
        match self {
            ApiError::Denied(reason) => Some(reason.code()),
            ApiError::Conflict(_) => Some("CONCURRENT_UPDATE"),
            ApiError::RateLimited => Some("RATE_LIMITED"),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    required: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    window_hours: Option<u32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    upgrade_suggested: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Store(_) if running_in_production() => "An internal error occurred".to_string(),
            _ => self.to_string(),
        };

        let mut body = ErrorResponse {
            detail,
            code: self.code(),
            required: None,
            available: None,
            limit: None,
            window_hours: None,
            upgrade_suggested: false,
        };

        if let ApiError::Denied(reason) = &self {
            body.upgrade_suggested = reason.upgrade_suggested();
            match *reason {
                DenialReason::InsufficientCredits {
                    required,
                    available,
                } => {
                    body.required = Some(required);
                    body.available = Some(available);
                }
                DenialReason::ImageLimitExceeded {
                    limit,
                    window_hours,
                } => {
                    body.limit = Some(limit);
                    body.window_hours = Some(window_hours);
                }
            }
        }

        if matches!(self, ApiError::RateLimited) {
            return (status, [(header::RETRY_AFTER, "1")], Json(body)).into_response();
        }

        (status, Json(body)).into_response()
    }
}
