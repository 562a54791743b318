use std::collections::BTreeMap;

use serde::Deserialize;
use thiserror::Error;

/// Result type for Plant API calls
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by the Plant API client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response, or its body could not be decoded
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API error {status} ({code}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Machine-readable error code
        code: String,
        /// Human-readable error message
        message: String,
        /// Per-field validation messages
        fields: BTreeMap<String, Vec<String>>,
    },
}

impl ClientError {
    /// HTTP status of an API error
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(_) => None,
        }
    }
}

/// Error envelope sent by the backend
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Vec<String>>,
}
