use async_trait::async_trait;

use alertsforge_common::env::env_or;

#[derive(Debug)]
pub struct BucketError(pub String);

impl std::fmt::Display for BucketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bucket: {}", self.0)
    }
}

impl std::error::Error for BucketError {}

/// Blob-store seam for enrichers that produce artifacts. Implementations are
/// long-lived and shared across enrichment tasks.
#[async_trait]
pub trait BucketWriter: Send + Sync {
    async fn write(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), BucketError>;
}

const GCS_UPLOAD_BASE: &str = "https://storage.googleapis.com/upload/storage/v1/b";

/// Uploads objects through the GCS JSON API with a bearer token from
/// `AF_GCS_TOKEN`.
pub struct GcsBucketWriter {
    client: reqwest::Client,
    token: String,
    upload_base: String,
}

impl GcsBucketWriter {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            token: env_or("AF_GCS_TOKEN", ""),
            upload_base: GCS_UPLOAD_BASE.to_string(),
        }
    }

    /// Test seam: point uploads at a local endpoint.
    pub fn with_upload_base(mut self, base: impl Into<String>) -> Self {
        self.upload_base = base.into();
        self
    }
}

#[async_trait]
impl BucketWriter for GcsBucketWriter {
    async fn write(&self, bucket: &str, key: &str, bytes: Vec<u8>) -> Result<(), BucketError> {
        self.client
            .post(format!("{}/{bucket}/o", self.upload_base))
            .query(&[("uploadType", "media"), ("name", key)])
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .body(bytes)
            .send()
            .await
            .map_err(|e| BucketError(e.to_string()))?
            .error_for_status()
            .map_err(|e| BucketError(e.to_string()))?;
        Ok(())
    }
}
