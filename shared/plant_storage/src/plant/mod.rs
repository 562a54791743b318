//! Plant storage module for `DynamoDB` operations
//!
//! Plants are keyed by a generated UUID. A global secondary index on `owner_id` serves the
//! "my plants" listing, while the public feed is a filtered scan over `posted`.

mod error;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::{
    error::SdkError,
    types::{AttributeValue, ReturnValue},
    Client as DynamoDbClient,
};
pub use error::{PlantStorageError, PlantStorageResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_dynamo::{from_item, from_items, to_item};
use strum::Display;

/// A plant photo shared by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Plant {
    /// Primary key - unique plant ID (UUID v4)
    pub id: String,
    /// ID of the user who created the plant, never changes
    pub owner_id: String,
    /// Display name of the plant
    pub name: String,
    /// Free text description
    pub description: String,
    /// Care advice written by the owner
    pub care_advice: String,
    /// Storage key of the uploaded image, relative to the public disk
    pub image_path: String,
    /// Whether the plant is visible in the public feed
    pub posted: bool,
    /// Timestamp of creation
    pub created_at: i64,
    /// Timestamp of the last update
    pub updated_at: i64,
}

/// Request to create a new plant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantCreateRequest {
    /// ID of the owning user
    pub owner_id: String,
    /// Display name of the plant
    pub name: String,
    /// Free text description
    pub description: String,
    /// Care advice written by the owner
    pub care_advice: String,
    /// Storage key of the already uploaded image
    pub image_path: String,
}

/// `DynamoDB` attribute names for the plants table
#[derive(Debug, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PlantAttribute {
    /// Primary key - unique plant ID
    Id,
    /// Owner user ID (used for GSI)
    OwnerId,
    /// Display name
    Name,
    /// Description
    Description,
    /// Care advice
    CareAdvice,
    /// Image storage key
    ImagePath,
    /// Public feed flag
    Posted,
    /// Creation timestamp
    CreatedAt,
    /// Last update timestamp
    UpdatedAt,
}

/// Operations the Plant API needs from a plant record store
#[async_trait]
pub trait PlantStore: Send + Sync {
    /// Creates a plant owned by `request.owner_id` with `posted = false`
    async fn create(&self, request: PlantCreateRequest) -> PlantStorageResult<Plant>;

    /// Gets a single plant by ID
    async fn get_one(&self, id: &str) -> PlantStorageResult<Option<Plant>>;

    /// Lists every plant owned by the given user
    async fn list_by_owner(&self, owner_id: &str) -> PlantStorageResult<Vec<Plant>>;

    /// Lists every plant with `posted = true`
    async fn list_posted(&self) -> PlantStorageResult<Vec<Plant>>;

    /// Sets the `posted` flag and returns the updated plant
    ///
    /// Fails with `PlantStorageError::PlantNotFound` when the plant does not exist.
    async fn set_posted(&self, id: &str, posted: bool) -> PlantStorageResult<Plant>;

    /// Deletes a plant by ID
    ///
    /// Fails with `PlantStorageError::PlantNotFound` when the plant does not exist.
    async fn delete(&self, id: &str) -> PlantStorageResult<()>;
}

/// Storage client for plant operations
pub struct PlantStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
    owner_index_name: String,
}

impl PlantStorage {
    /// Creates a new storage instance
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client
    /// * `table_name` - `DynamoDB` table name for plants
    /// * `owner_index_name` - Name of the GSI for owner queries
    #[must_use]
    pub const fn new(
        dynamodb_client: Arc<DynamoDbClient>,
        table_name: String,
        owner_index_name: String,
    ) -> Self {
        Self {
            dynamodb_client,
            table_name,
            owner_index_name,
        }
    }

    fn id_key(id: &str) -> (String, AttributeValue) {
        (
            PlantAttribute::Id.to_string(),
            AttributeValue::S(id.to_string()),
        )
    }
}

#[async_trait]
impl PlantStore for PlantStorage {
    async fn create(&self, request: PlantCreateRequest) -> PlantStorageResult<Plant> {
        let now = chrono::Utc::now().timestamp();
        let plant = Plant {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: request.owner_id,
            name: request.name,
            description: request.description,
            care_advice: request.care_advice,
            image_path: request.image_path,
            posted: false,
            created_at: now,
            updated_at: now,
        };

        let item = to_item(&plant)?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await?;

        Ok(plant)
    }

    async fn get_one(&self, id: &str) -> PlantStorageResult<Option<Plant>> {
        let (key, value) = Self::id_key(id);
        let response = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .key(key, value)
            .send()
            .await?;

        response
            .item()
            .map(|item| from_item(item.clone()).map_err(PlantStorageError::from))
            .transpose()
    }

    async fn list_by_owner(&self, owner_id: &str) -> PlantStorageResult<Vec<Plant>> {
        let mut items = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let response = self
                .dynamodb_client
                .query()
                .table_name(&self.table_name)
                .index_name(&self.owner_index_name)
                .key_condition_expression("#owner = :owner")
                .expression_attribute_names("#owner", PlantAttribute::OwnerId.to_string())
                .expression_attribute_values(":owner", AttributeValue::S(owner_id.to_string()))
                .set_exclusive_start_key(start_key)
                .send()
                .await?;

            items.extend(response.items.unwrap_or_default());

            match response.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(from_items(items)?)
    }

    async fn list_posted(&self) -> PlantStorageResult<Vec<Plant>> {
        let mut items = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let response = self
                .dynamodb_client
                .scan()
                .table_name(&self.table_name)
                .filter_expression("#posted = :posted")
                .expression_attribute_names("#posted", PlantAttribute::Posted.to_string())
                .expression_attribute_values(":posted", AttributeValue::Bool(true))
                .set_exclusive_start_key(start_key)
                .send()
                .await?;

            items.extend(response.items.unwrap_or_default());

            match response.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(from_items(items)?)
    }

    async fn set_posted(&self, id: &str, posted: bool) -> PlantStorageResult<Plant> {
        let (key, value) = Self::id_key(id);
        let response = self
            .dynamodb_client
            .update_item()
            .table_name(&self.table_name)
            .key(key, value)
            .update_expression("SET #posted = :posted, #updated_at = :updated_at")
            .condition_expression("attribute_exists(#id)")
            .expression_attribute_names("#id", PlantAttribute::Id.to_string())
            .expression_attribute_names("#posted", PlantAttribute::Posted.to_string())
            .expression_attribute_names("#updated_at", PlantAttribute::UpdatedAt.to_string())
            .expression_attribute_values(":posted", AttributeValue::Bool(posted))
            .expression_attribute_values(
                ":updated_at",
                AttributeValue::N(chrono::Utc::now().timestamp().to_string()),
            )
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    PlantStorageError::PlantNotFound(id.to_string())
                } else {
                    err.into()
                }
            })?;

        let attributes = response
            .attributes
            .ok_or_else(|| PlantStorageError::PlantNotFound(id.to_string()))?;

        Ok(from_item(attributes)?)
    }

    async fn delete(&self, id: &str) -> PlantStorageResult<()> {
        let (key, value) = Self::id_key(id);
        self.dynamodb_client
            .delete_item()
            .table_name(&self.table_name)
            .key(key, value)
            .condition_expression("attribute_exists(#id)")
            .expression_attribute_names("#id", PlantAttribute::Id.to_string())
            .send()
            .await
            .map_err(|err| {
                if matches!(
                    err,
                    SdkError::ServiceError(ref svc) if svc.err().is_conditional_check_failed_exception()
                ) {
                    PlantStorageError::PlantNotFound(id.to_string())
                } else {
                    err.into()
                }
            })?;

        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! In-memory plant store keeping insertion order

    use std::sync::{Mutex, PoisonError};

    use async_trait::async_trait;

    use super::{Plant, PlantCreateRequest, PlantStorageError, PlantStorageResult, PlantStore};

    /// Plant store backed by a `Vec`, for tests and local runs without `DynamoDB`
    #[derive(Default)]
    pub struct InMemoryPlantStorage {
        plants: Mutex<Vec<Plant>>,
    }

    impl InMemoryPlantStorage {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Number of stored plants
        #[must_use]
        pub fn len(&self) -> usize {
            self.plants.lock().unwrap_or_else(PoisonError::into_inner).len()
        }

        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl PlantStore for InMemoryPlantStorage {
        async fn create(&self, request: PlantCreateRequest) -> PlantStorageResult<Plant> {
            let now = chrono::Utc::now().timestamp();
            let plant = Plant {
                id: uuid::Uuid::new_v4().to_string(),
                owner_id: request.owner_id,
                name: request.name,
                description: request.description,
                care_advice: request.care_advice,
                image_path: request.image_path,
                posted: false,
                created_at: now,
                updated_at: now,
            };

            self.plants
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(plant.clone());

            Ok(plant)
        }

        async fn get_one(&self, id: &str) -> PlantStorageResult<Option<Plant>> {
            Ok(self
                .plants
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .find(|plant| plant.id == id)
                .cloned())
        }

        async fn list_by_owner(&self, owner_id: &str) -> PlantStorageResult<Vec<Plant>> {
            Ok(self
                .plants
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .filter(|plant| plant.owner_id == owner_id)
                .cloned()
                .collect())
        }

        async fn list_posted(&self) -> PlantStorageResult<Vec<Plant>> {
            Ok(self
                .plants
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .filter(|plant| plant.posted)
                .cloned()
                .collect())
        }

        async fn set_posted(&self, id: &str, posted: bool) -> PlantStorageResult<Plant> {
            let mut plants = self.plants.lock().unwrap_or_else(PoisonError::into_inner);
            let plant = plants
                .iter_mut()
                .find(|plant| plant.id == id)
                .ok_or_else(|| PlantStorageError::PlantNotFound(id.to_string()))?;

            plant.posted = posted;
            plant.updated_at = chrono::Utc::now().timestamp();

            Ok(plant.clone())
        }

        async fn delete(&self, id: &str) -> PlantStorageResult<()> {
            let mut plants = self.plants.lock().unwrap_or_else(PoisonError::into_inner);
            let position = plants
                .iter()
                .position(|plant| plant.id == id)
                .ok_or_else(|| PlantStorageError::PlantNotFound(id.to_string()))?;

            plants.remove(position);
            Ok(())
        }
    }
}
