//! Error types for plant storage operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{
    delete_item::DeleteItemError, get_item::GetItemError, put_item::PutItemError,
    query::QueryError, scan::ScanError, update_item::UpdateItemError,
};
use thiserror::Error;

/// Result type alias for plant storage operations
pub type PlantStorageResult<T> = Result<T, PlantStorageError>;

/// Storage error types for plant operations
#[derive(Debug, Error)]
pub enum PlantStorageError {
    /// Failed to insert plant into `DynamoDB`
    #[error("Failed to insert plant into DynamoDB: {0}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to get plant from `DynamoDB`
    #[error("Failed to get plant from DynamoDB: {0}")]
    DynamoDbGetError(#[from] SdkError<GetItemError>),

    /// Failed to query plants by owner from `DynamoDB`
    #[error("Failed to query plants from DynamoDB: {0}")]
    DynamoDbQueryError(#[from] SdkError<QueryError>),

    /// Failed to scan posted plants from `DynamoDB`
    #[error("Failed to scan plants from DynamoDB: {0}")]
    DynamoDbScanError(#[from] SdkError<ScanError>),

    /// Failed to update plant in `DynamoDB`
    #[error("Failed to update plant in DynamoDB: {0}")]
    DynamoDbUpdateError(#[from] SdkError<UpdateItemError>),

    /// Failed to delete plant from `DynamoDB`
    #[error("Failed to delete plant from DynamoDB: {0}")]
    DynamoDbDeleteError(#[from] SdkError<DeleteItemError>),

    /// No plant with the given id
    #[error("Plant not found: {0}")]
    PlantNotFound(String),

    /// Failed to convert a plant from or to a `DynamoDB` item
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_dynamo::Error> for PlantStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
