use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info};

use super::{MediaStorageError, MediaStorageResult, MediaStore};

/// Image storage on the local public disk
///
/// The backend serves this directory under `/storage`, so a key `plants/a.png` is reachable
/// at `<APP_URL>/storage/plants/a.png`.
#[derive(Debug, Clone)]
pub struct LocalMediaStorage {
    root: PathBuf,
}

impl LocalMediaStorage {
    /// Creates the storage, making sure the root directory exists
    ///
    /// # Errors
    ///
    /// Returns `MediaStorageError::Io` if the root directory cannot be created
    pub async fn new(root: PathBuf) -> MediaStorageResult<Self> {
        fs::create_dir_all(&root).await?;
        info!(path = %root.display(), "Local media storage initialized");
        Ok(Self { root })
    }

    /// Root directory of the public disk
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a key to a path under the root, rejecting traversal
    fn resolve(&self, key: &str) -> MediaStorageResult<PathBuf> {
        let mut resolved = self.root.clone();
        let mut has_segment = false;

        for component in Path::new(key).components() {
            match component {
                Component::Normal(segment) => {
                    resolved.push(segment);
                    has_segment = true;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(MediaStorageError::InvalidKey(key.to_string()));
                }
            }
        }

        if !has_segment {
            return Err(MediaStorageError::InvalidKey(key.to_string()));
        }

        Ok(resolved)
    }
}

#[async_trait]
impl MediaStore for LocalMediaStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> MediaStorageResult<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&path, &bytes).await?;

        debug!(key, size = bytes.len(), "Stored object on local disk");
        Ok(())
    }

    async fn delete(&self, key: &str) -> MediaStorageResult<()> {
        let path = self.resolve(key)?;
        fs::remove_file(&path).await?;

        debug!(key, "Deleted object from local disk");
        Ok(())
    }

    async fn exists(&self, key: &str) -> MediaStorageResult<bool> {
        let path = self.resolve(key)?;
        Ok(fs::try_exists(&path).await?)
    }
}
