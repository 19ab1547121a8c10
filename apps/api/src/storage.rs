//! Object storage for uploaded resume files. Talks to any S3-compatible
//! endpoint; by default the Supabase Storage S3 gateway.

use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::{info, warn};

use crate::config::StorageConfig;
use crate::errors::AppError;

#[derive(Clone)]
pub struct Storage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl Storage {
    /// Loads the shared SDK config and builds a path-style client for the
    /// configured endpoint.
    pub async fn connect(config: &StorageConfig) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials(config))
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        // Supabase and MinIO only accept path-style addressing.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }

    /// Builds a client without loading the environment. Nothing is contacted
    /// until the first request.
    #[cfg(test)]
    pub fn offline(config: &StorageConfig) -> Self {
        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials(config))
            .endpoint_url(&config.endpoint)
            .force_path_style(true)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub async fn upload(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), AppError> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload {key}: {e}")))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    /// Best-effort delete used to roll back an upload.
    pub async fn remove(&self, key: &str) {
        if let Err(e) = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            warn!("Failed to remove s3://{}/{}: {e}", self.bucket, key);
        }
    }
}

fn credentials(config: &StorageConfig) -> Credentials {
    Credentials::new(
        &config.access_key_id,
        &config.secret_access_key,
        None,
        None,
        "skillgap-static",
    )
}
