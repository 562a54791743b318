//! Universal error handling for the API

use std::collections::BTreeMap;

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use plant_storage::{plant::PlantStorageError, user::UserStorageError};
use schemars::JsonSchema;
use serde::Serialize;

use crate::media_storage::MediaStorageError;

/// Field name to list of validation messages
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// API error response envelope
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: String,
    /// Per-field validation messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
    /// Raw message of the underlying failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, msg: impl Into<String>, retry: bool) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody {
                    code,
                    message: msg.into(),
                    fields: None,
                    detail: None,
                },
            },
        }
    }

    /// 422 with the offending fields
    #[must_use]
    pub fn validation(fields: FieldErrors) -> Self {
        let mut err = Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            "The given data was invalid",
            false,
        );
        err.inner.error.fields = Some(fields);
        err
    }

    /// 403 for actions on a plant the caller does not own
    #[must_use]
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", msg, false)
    }

    /// 404 for unknown resources
    #[must_use]
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", msg, false)
    }

    /// 500 carrying the raw message of the failure
    #[must_use]
    pub fn internal(msg: impl Into<String>, detail: impl Into<String>) -> Self {
        let mut err = Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            msg,
            true,
        );
        err.inner.error.detail = Some(detail.into());
        err
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.error.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {} ({})",
                self.inner.error.code,
                self.inner.error.message,
                self.inner.error.detail.as_deref().unwrap_or_default()
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert plant storage errors to application errors
impl From<PlantStorageError> for AppError {
    fn from(err: PlantStorageError) -> Self {
        match &err {
            PlantStorageError::PlantNotFound(id) => {
                tracing::debug!("Plant not found: {id}");
                Self::not_found("Plant not found")
            }
            _ => Self::internal("Plant storage operation failed", err.to_string()),
        }
    }
}

/// Convert user directory errors to application errors
impl From<UserStorageError> for AppError {
    fn from(err: UserStorageError) -> Self {
        Self::internal("User lookup failed", err.to_string())
    }
}

/// Convert media storage errors to application errors
impl From<MediaStorageError> for AppError {
    fn from(err: MediaStorageError) -> Self {
        match &err {
            MediaStorageError::UpstreamError(msg) => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "upstream_error",
                format!("Image storage temporarily unavailable: {msg}"),
                true,
            ),
            MediaStorageError::InvalidKey(key) => {
                Self::internal("Invalid image storage key", key.clone())
            }
            MediaStorageError::S3Error(_) | MediaStorageError::Io(_) => {
                Self::internal("Image storage operation failed", err.to_string())
            }
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
