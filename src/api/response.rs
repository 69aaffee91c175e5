//! Response types for the reconciliation API.
//!
//! This module defines the error response structures and the mapping from
//! engine errors to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::ReconError;

use super::request::UploadSlot;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// One or more upload slots were not filled.
    pub fn missing_files(missing: &[UploadSlot]) -> Self {
        let names: Vec<&str> = missing.iter().map(|slot| slot.field_name()).collect();
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::with_details(
                "MISSING_FILES",
                "All five files must be uploaded before processing",
                names.join(", "),
            ),
        }
    }

    /// The multipart body could not be read.
    pub fn invalid_upload(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::with_details("INVALID_UPLOAD", "Malformed upload", message),
        }
    }

    /// The worker running the reconciliation did not finish. The cause is
    /// logged, not returned.
    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new("INTERNAL_ERROR", "Reconciliation did not complete"),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<ReconError> for ApiErrorResponse {
    fn from(error: ReconError) -> Self {
        if error.is_parse_error() {
            return ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::with_details(
                    "PARSE_ERROR",
                    "An input file could not be read",
                    error.to_string(),
                ),
            };
        }

        match error {
            ReconError::JoinKeyMismatch { .. } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::with_details(
                    "JOIN_KEY_MISMATCH",
                    "Employee identifiers are stored differently across inputs",
                    error.to_string(),
                ),
            },
            ReconError::ReportWrite { message } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "REPORT_ERROR",
                    "Failed to build the result workbook",
                    message,
                ),
            },
            other => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    other.to_string(),
                ),
            },
        }
    }
}
