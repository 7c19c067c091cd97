//! Error handling
//!
//! All error types of the service and the conversion of request-level
//! failures into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Startup configuration problems. Fatal before the listener binds.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Failures of the tabular store (spreadsheet)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),

    #[error("store rejected credentials: {0}")]
    Auth(String),

    #[error("table \"{0}\" not found in the store")]
    TableNotFound(String),

    #[error("store call timed out after {0} ms")]
    Timeout(u128),

    #[error("unexpected store response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    /// Errors worth a second attempt. Auth and missing tables never heal on retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unreachable(_) | StoreError::Timeout(_))
    }
}

/// Failures of the notification (e-mail) channel. Never surfaced to callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotifyError {
    #[error("notification transport error: {0}")]
    Transport(String),

    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("notification timed out")]
    Timeout,
}

/// Fare computation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FareError {
    #[error("tariff {id} is a {actual} tariff, expected {expected}")]
    ModeMismatch {
        id: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("unknown vehicle tariff: {0}")]
    UnknownTariff(String),
}

/// Outcome of a rejected submission
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("{0}")]
    Validation(String),

    #[error("persistence failed: {0}")]
    PersistenceFailed(#[from] StoreError),
}

/// Request-level errors of the HTTP layer
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Persistence error: {detail}")]
    Persistence { detail: String, fallback_phone: String },

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Map a submission failure, attaching the phone number shown to the user
    pub fn from_submission(err: SubmissionError, fallback_phone: &str) -> Self {
        match err {
            SubmissionError::Validation(msg) => AppError::Validation(msg),
            SubmissionError::PersistenceFailed(e) => AppError::Persistence {
                detail: e.to_string(),
                fallback_phone: fallback_phone.to_string(),
            },
        }
    }
}

impl From<FareError> for AppError {
    fn from(err: FareError) -> Self {
        match err {
            FareError::UnknownTariff(id) => AppError::NotFound(format!("Unknown vehicle: {}", id)),
            mismatch @ FareError::ModeMismatch { .. } => AppError::BadRequest(mismatch.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => {
                log::warn!("⚠️ Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::BadRequest(msg) => {
                log::warn!("⚠️ Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            AppError::NotFound(msg) => {
                log::warn!("🔍 Not found: {}", msg);
                (StatusCode::NOT_FOUND, msg)
            }
            AppError::Persistence {
                detail,
                fallback_phone,
            } => {
                log::error!("❌ Persistence error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!(
                        "We could not save your request. Please try again or call us directly at {}.",
                        fallback_phone
                    ),
                )
            }
            AppError::ExternalApi(msg) => {
                log::error!("❌ External API error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "An error occurred while communicating with an external service".to_string(),
                )
            }
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

pub fn bad_request_error(message: &str) -> AppError {
    AppError::BadRequest(message.to_string())
}
