//! Error types for user directory operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use thiserror::Error;

/// Result type alias for user directory operations
pub type UserStorageResult<T> = Result<T, UserStorageError>;

/// Storage error types for user lookups
#[derive(Debug, Error)]
pub enum UserStorageError {
    /// Failed to get user from `DynamoDB`
    #[error("Failed to get user from DynamoDB: {0}")]
    DynamoDbGetError(#[from] SdkError<GetItemError>),

    /// Failed to parse user from `DynamoDB` item
    #[error("Failed to parse user: {0}")]
    SerializationError(String),
}

impl From<serde_dynamo::Error> for UserStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
