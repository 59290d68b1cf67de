//! R2 client implementation.

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Default lifetime of presigned artifact URLs (7 days, the SigV4 maximum).
pub const DEFAULT_SIGNED_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Configuration for R2 client.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// R2 endpoint URL (S3 API endpoint)
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region (usually "auto" for R2)
    pub region: String,
    /// Public base URL for the bucket; when set, artifacts get plain public URLs
    pub public_base_url: Option<String>,
    /// Lifetime of presigned URLs in seconds
    pub signed_url_expiry_secs: u64,
}

impl R2Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        let signed_url_expiry_secs = match std::env::var("SIGNED_URL_EXPIRY_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                StorageError::config_error(format!("SIGNED_URL_EXPIRY_SECS is not a number: {}", raw))
            })?,
            Err(_) => DEFAULT_SIGNED_URL_EXPIRY_SECS,
        };

        Ok(Self {
            endpoint_url: std::env::var("R2_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("R2_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("R2_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("R2_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("R2_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("R2_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("R2_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("R2_BUCKET_NAME not set"))?,
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            signed_url_expiry_secs,
        })
    }
}

/// Cloudflare R2 storage client.
#[derive(Clone)]
pub struct R2Client {
    client: Client,
    bucket: String,
    public_base_url: Option<String>,
    signed_url_expiry: Duration,
}

impl R2Client {
    /// Create a new R2 client from configuration.
    pub async fn new(config: R2Config) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(sdk_config);

        Ok(Self {
            client,
            bucket: config.bucket_name,
            public_base_url: config
                .public_base_url
                .map(|u| u.trim_end_matches('/').to_string()),
            signed_url_expiry: Duration::from_secs(config.signed_url_expiry_secs.max(1)),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = R2Config::from_env()?;
        Self::new(config).await
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload a file to R2.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Generate a presigned URL for GET (temporary, signed URL via S3 API).
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    /// URL handed back to clients: public when a base URL is configured, presigned otherwise.
    pub async fn object_url(&self, key: &str) -> StorageResult<String> {
        match &self.public_base_url {
            Some(base) => Ok(public_url(base, key)),
            None => self.presign_get(key, self.signed_url_expiry).await,
        }
    }

    /// Check connectivity to R2 by performing a head bucket operation.
    pub async fn check_connectivity(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("R2 connectivity check failed: {}", e)))?;
        Ok(())
    }
}

/// Join a public base URL and an object key, encoding each key segment.
pub fn public_url(base: &str, key: &str) -> String {
    let encoded: Vec<String> = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", base.trim_end_matches('/'), encoded.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(public: Option<&str>) -> R2Config {
        R2Config {
            endpoint_url: "http://127.0.0.1:9000".to_string(),
            access_key_id: "test-access".to_string(),
            secret_access_key: "test-secret".to_string(),
            bucket_name: "renders".to_string(),
            region: "auto".to_string(),
            public_base_url: public.map(str::to_string),
            signed_url_expiry_secs: DEFAULT_SIGNED_URL_EXPIRY_SECS,
        }
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            public_url("https://cdn.example.com/", "renders/job-1.mp4"),
            "https://cdn.example.com/renders/job-1.mp4"
        );
        assert_eq!(
            public_url("https://cdn.example.com", "renders/a b.mp4"),
            "https://cdn.example.com/renders/a%20b.mp4"
        );
    }

    #[tokio::test]
    async fn test_object_url_prefers_public_base() {
        let client = R2Client::new(config(Some("https://cdn.example.com/")))
            .await
            .unwrap();
        let url = client.object_url("renders/job-1.mp4").await.unwrap();
        assert_eq!(url, "https://cdn.example.com/renders/job-1.mp4");
    }

    #[tokio::test]
    async fn test_object_url_presigns_without_public_base() {
        let client = R2Client::new(config(None)).await.unwrap();
        let url = client.object_url("renders/job-1.mp4").await.unwrap();
        assert!(url.starts_with("http://127.0.0.1:9000/renders/renders/job-1.mp4?"));
        assert!(url.contains("X-Amz-Signature="));
        assert!(url.contains("X-Amz-Expires=604800"));
    }
}
