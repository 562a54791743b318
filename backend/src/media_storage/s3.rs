use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::{
    error::SdkError, operation::head_object::HeadObjectError, primitives::ByteStream,
    types::ObjectCannedAcl, Client as S3Client,
};
use tracing::debug;

use super::{MediaStorageError, MediaStorageResult, MediaStore};

/// Image storage backed by an S3 bucket with public-read objects
pub struct S3MediaStorage {
    s3_client: Arc<S3Client>,
    bucket_name: String,
}

impl S3MediaStorage {
    /// Creates a new S3 media storage client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket name for plant images
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String) -> Self {
        Self {
            s3_client,
            bucket_name,
        }
    }
}

#[async_trait]
impl MediaStore for S3MediaStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> MediaStorageResult<()> {
        let content_length = bytes.len();

        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        debug!(key, content_length, "Stored object in S3");
        Ok(())
    }

    async fn delete(&self, key: &str) -> MediaStorageResult<()> {
        self.s3_client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await?;

        debug!(key, "Deleted object from S3");
        Ok(())
    }

    #[allow(clippy::cognitive_complexity)]
    async fn exists(&self, key: &str) -> MediaStorageResult<bool> {
        let result = self
            .s3_client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
            {
                Ok(false)
            }
            Err(SdkError::ServiceError(service_err))
                if service_err.raw().status().as_u16() >= 500 =>
            {
                Err(MediaStorageError::UpstreamError(format!("{service_err:?}")))
            }
            Err(e) => Err(MediaStorageError::S3Error(e.to_string())),
        }
    }
}
