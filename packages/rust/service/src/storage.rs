//! Object store client for rendered PDF artifacts.
//!
//! Supabase-Storage-shaped HTTP API: a bucket listing endpoint, bucket
//! creation, binary upload with upsert, and predictable public URLs. The
//! target bucket is auto-provisioned on first upload.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, instrument};

use solguide_shared::{ObjectStoreConfig, Result, SolguideError};

const USER_AGENT: &str = concat!("Solguide/", env!("CARGO_PKG_VERSION"));

/// Upload size cap requested at bucket creation, 50 MB.
const BUCKET_SIZE_LIMIT: u64 = 52_428_800;

/// Collision-safe object key for one rendered guide.
///
/// Topic numbers can contain characters that are unsafe in object keys, so
/// everything outside `[A-Za-z0-9-]` is replaced; the millisecond timestamp
/// keeps successive regenerations from overwriting each other's history.
pub fn storage_key(topic_number: &str, now: DateTime<Utc>) -> String {
    let sanitized: String = topic_number
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{sanitized}_instructions_{}.pdf", now.timestamp_millis())
}

/// Destination for rendered PDF bytes.
#[allow(async_fn_in_trait)]
pub trait ObjectStore: Send + Sync {
    /// Upload PDF bytes under `key` and return the object's public URL.
    async fn store_pdf(&self, key: &str, bytes: Vec<u8>) -> Result<String>;
}

/// HTTP client for a Supabase-Storage-style object store.
pub struct HttpObjectStore {
    client: Client,
    endpoint: String,
    bucket: String,
    api_key: String,
}

impl HttpObjectStore {
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| SolguideError::Storage(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            api_key: api_key.into(),
        })
    }

    /// Build a store from config, reading the API key from the configured
    /// environment variable.
    pub fn from_config(config: &ObjectStoreConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            SolguideError::config(format!(
                "object store API key not set ({})",
                config.api_key_env
            ))
        })?;
        Self::new(&config.endpoint, &config.bucket, api_key)
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key).bearer_auth(&self.api_key)
    }

    /// Create the target bucket if the store does not have it yet.
    async fn ensure_bucket(&self) -> Result<()> {
        #[derive(Deserialize)]
        struct Bucket {
            name: String,
        }

        let response = self
            .authed(self.client.get(format!("{}/storage/v1/bucket", self.endpoint)))
            .send()
            .await
            .map_err(|e| SolguideError::Storage(format!("list buckets: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SolguideError::Storage(format!("list buckets: HTTP {status}")));
        }

        let buckets: Vec<Bucket> = response
            .json()
            .await
            .map_err(|e| SolguideError::Storage(format!("decode bucket list: {e}")))?;

        if buckets.iter().any(|b| b.name == self.bucket) {
            return Ok(());
        }

        info!(bucket = %self.bucket, "creating storage bucket");
        let response = self
            .authed(self.client.post(format!("{}/storage/v1/bucket", self.endpoint)))
            .json(&serde_json::json!({
                "name": self.bucket,
                "public": true,
                "file_size_limit": BUCKET_SIZE_LIMIT,
                "allowed_mime_types": ["application/pdf"],
            }))
            .send()
            .await
            .map_err(|e| SolguideError::Storage(format!("create bucket: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SolguideError::Storage(format!("create bucket: HTTP {status}")));
        }
        Ok(())
    }
}

impl ObjectStore for HttpObjectStore {
    #[instrument(skip_all, fields(key = %key, bytes = bytes.len()))]
    async fn store_pdf(&self, key: &str, bytes: Vec<u8>) -> Result<String> {
        self.ensure_bucket().await?;

        let response = self
            .authed(self.client.post(format!(
                "{}/storage/v1/object/{}/{key}",
                self.endpoint, self.bucket
            )))
            .header("content-type", "application/pdf")
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await
            .map_err(|e| SolguideError::Storage(format!("upload {key}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SolguideError::Storage(format!("upload {key}: HTTP {status}")));
        }

        let url = format!(
            "{}/storage/v1/object/public/{}/{key}",
            self.endpoint, self.bucket
        );
        info!(url = %url, "artifact uploaded");
        Ok(url)
    }
}
