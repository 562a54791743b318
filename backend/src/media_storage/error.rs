//! Error types for media storage operations

use aws_sdk_s3::{
    error::SdkError,
    operation::{delete_object::DeleteObjectError, put_object::PutObjectError},
};
use thiserror::Error;

/// Result type for media storage operations
pub type MediaStorageResult<T> = Result<T, MediaStorageError>;

/// Errors that can occur while storing or deleting plant images
#[derive(Error, Debug)]
pub enum MediaStorageError {
    /// S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// Upstream service error (5xx from S3)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    /// Local disk error
    #[error("Local storage error: {0}")]
    Io(#[from] std::io::Error),

    /// Key escapes the storage root or is otherwise unusable
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

impl From<SdkError<PutObjectError>> for MediaStorageError {
    fn from(error: SdkError<PutObjectError>) -> Self {
        match error {
            SdkError::ServiceError(err) if err.raw().status().as_u16() >= 500 => {
                Self::UpstreamError(format!("{:?}", err.err()))
            }
            other => Self::S3Error(other.to_string()),
        }
    }
}

impl From<SdkError<DeleteObjectError>> for MediaStorageError {
    fn from(error: SdkError<DeleteObjectError>) -> Self {
        match error {
            SdkError::ServiceError(err) if err.raw().status().as_u16() >= 500 => {
                Self::UpstreamError(format!("{:?}", err.err()))
            }
            other => Self::S3Error(other.to_string()),
        }
    }
}
