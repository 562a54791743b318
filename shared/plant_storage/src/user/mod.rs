//! Read-only user directory
//!
//! Users and their addresses are managed by the account service. The plant feed only
//! needs to look them up to show who shared a plant and where they live.

mod error;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::{types::AttributeValue, Client as DynamoDbClient};
pub use error::{UserStorageError, UserStorageResult};
use futures::future::try_join_all;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Postal address attached to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// A registered user, as stored by the account service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct User {
    /// Primary key - user ID, also the `sub` of access tokens
    pub id: String,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Optional postal address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
}

/// `DynamoDB` attribute names for the users table
#[derive(Debug, Display)]
#[strum(serialize_all = "snake_case")]
pub enum UserAttribute {
    /// Primary key - user ID
    Id,
}

/// Lookups the Plant API needs from the user directory
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Gets a single user by ID
    async fn get_one(&self, id: &str) -> UserStorageResult<Option<User>>;

    /// Gets several users at once, keyed by ID; unknown IDs are left out
    async fn get_many(&self, ids: &[String]) -> UserStorageResult<HashMap<String, User>> {
        let users = try_join_all(ids.iter().map(|id| self.get_one(id))).await?;

        Ok(users
            .into_iter()
            .flatten()
            .map(|user| (user.id.clone(), user))
            .collect())
    }
}

/// Storage client for the users table
pub struct UserStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl UserStorage {
    /// Creates a new storage instance
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client
    /// * `table_name` - `DynamoDB` table name for users
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }
}

#[async_trait]
impl UserStore for UserStorage {
    async fn get_one(&self, id: &str) -> UserStorageResult<Option<User>> {
        let response = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .key(
                UserAttribute::Id.to_string(),
                AttributeValue::S(id.to_string()),
            )
            .send()
            .await?;

        response
            .item()
            .map(|item| serde_dynamo::from_item(item.clone()).map_err(UserStorageError::from))
            .transpose()
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! In-memory user directory

    use std::collections::HashMap;
    use std::sync::{Mutex, PoisonError};

    use async_trait::async_trait;

    use super::{User, UserStorageResult, UserStore};

    /// User directory backed by a `HashMap`
    #[derive(Default)]
    pub struct InMemoryUserStorage {
        users: Mutex<HashMap<String, User>>,
    }

    impl InMemoryUserStorage {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Adds or replaces a user
        pub fn insert(&self, user: User) {
            self.users
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(user.id.clone(), user);
        }
    }

    #[async_trait]
    impl UserStore for InMemoryUserStorage {
        async fn get_one(&self, id: &str) -> UserStorageResult<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(id)
                .cloned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::InMemoryUserStorage;
    use super::*;

    fn user(id: &str, address: Option<Address>) -> User {
        User {
            id: id.to_string(),
            name: format!("User {id}"),
            email: format!("{id}@example.com"),
            address,
        }
    }

    #[test]
    fn test_user_without_address_omits_field() {
        let json = serde_json::to_value(user("alice", None)).unwrap();
        assert!(json.get("address").is_none());

        let parsed: User = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.address, None);
    }

    #[tokio::test]
    async fn test_get_many_skips_unknown_ids() {
        let storage = InMemoryUserStorage::new();
        storage.insert(user(
            "alice",
            Some(Address {
                street: "1 Rue des Lilas".to_string(),
                city: "Lyon".to_string(),
                postal_code: "69001".to_string(),
                country: "France".to_string(),
            }),
        ));
        storage.insert(user("bob", None));

        let users = storage
            .get_many(&["alice".to_string(), "ghost".to_string()])
            .await
            .unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users["alice"].address.as_ref().unwrap().city, "Lyon");
    }
}
