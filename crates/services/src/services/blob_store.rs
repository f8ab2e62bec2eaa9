//! Object storage for generated card illustrations.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

const CARD_IMAGE_PREFIX: &str = "flashcards";
const CARD_IMAGE_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("missing bucket: BLOB_BUCKET environment variable not set")]
    MissingBucket,
}

/// Capability that persists image bytes and returns a durable public URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn store_card_image(
        &self,
        card_id: Uuid,
        image: Bytes,
    ) -> Result<String, BlobStoreError>;
}

/// S3-backed blob store
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    public_base_url: String,
}

impl S3BlobStore {
    /// Create a store from the standard AWS environment plus `BLOB_BUCKET`
    /// and an optional `BLOB_PUBLIC_BASE_URL` (CDN) override.
    pub async fn from_env() -> Result<Self, BlobStoreError> {
        let bucket = std::env::var("BLOB_BUCKET").map_err(|_| BlobStoreError::MissingBucket)?;

        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let region = config
            .region()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "us-east-1".to_string());
        let public_base_url = std::env::var("BLOB_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{bucket}.s3.{region}.amazonaws.com"));

        Ok(Self {
            client: aws_sdk_s3::Client::new(&config),
            bucket,
            public_base_url,
        })
    }

    /// Stable per-card key: a regenerated image overwrites the previous
    /// object instead of accumulating suffixed copies.
    fn object_key(card_id: Uuid) -> String {
        format!("{CARD_IMAGE_PREFIX}/{card_id}.png")
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn store_card_image(
        &self,
        card_id: Uuid,
        image: Bytes,
    ) -> Result<String, BlobStoreError> {
        let key = Self::object_key(card_id);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(image))
            .content_type(CARD_IMAGE_CONTENT_TYPE)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| BlobStoreError::Upload(e.to_string()))?;

        let url = format!("{}/{key}", self.public_base_url.trim_end_matches('/'));
        debug!(card_id = %card_id, url = %url, "uploaded card illustration");
        Ok(url)
    }
}
