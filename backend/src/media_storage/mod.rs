//! Plant image storage
//!
//! Images live on a public tier: either an S3 bucket or the local public disk served by the
//! backend itself. Both are addressed by a relative key such as `plants/<uuid>.png`, which is
//! what plant records keep in `image_path`.

mod error;
mod local;
mod s3;

use async_trait::async_trait;

pub use error::{MediaStorageError, MediaStorageResult};
pub use local::LocalMediaStorage;
pub use s3::S3MediaStorage;

/// Key prefix for plant images
pub const PLANT_IMAGE_PREFIX: &str = "plants";

/// Blob operations the Plant API relies on
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores `bytes` under `key`, replacing any previous object
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> MediaStorageResult<()>;

    /// Deletes the object stored under `key`
    async fn delete(&self, key: &str) -> MediaStorageResult<()>;

    /// Checks whether an object is stored under `key`
    async fn exists(&self, key: &str) -> MediaStorageResult<bool>;
}

/// Builds a collision-resistant key `<prefix>/<uuid>.<extension>`
#[must_use]
pub fn generate_object_key(prefix: &str, extension: &str) -> String {
    format!("{prefix}/{}.{extension}", uuid::Uuid::new_v4().simple())
}

/// Base URL of the public storage tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicStorageUrl {
    base_url: String,
}

impl PublicStorageUrl {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Public URL of a stored object: `<base>/storage/<key>`
    #[must_use]
    pub fn url_for(&self, key: &str) -> String {
        format!("{}/storage/{}", self.base_url, key.trim_start_matches('/'))
    }
}
