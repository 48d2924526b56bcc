//! Cloudflare R2 publisher over the S3 API.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::publisher::{StoragePublisher, UploadOptions};

/// Posters are regenerated daily; a day of edge caching is enough.
const CACHE_CONTROL: &str = "public, max-age=86400";

/// Bucket credentials and the public origin posters are served from.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// S3 API endpoint of the account
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    /// "auto" for R2
    pub region: String,
    /// Public bucket or custom-domain URL that objects are served from
    pub public_base_url: String,
}

impl R2Config {
    /// Read `R2_*` variables. Every variable except `R2_REGION` is required.
    pub fn from_env() -> StorageResult<Self> {
        fn required(key: &str) -> StorageResult<String> {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| StorageError::not_configured(format!("{key} not set")))
        }

        Ok(Self {
            endpoint_url: required("R2_ENDPOINT_URL")?,
            access_key_id: required("R2_ACCESS_KEY_ID")?,
            secret_access_key: required("R2_SECRET_ACCESS_KEY")?,
            bucket_name: required("R2_BUCKET_NAME")?,
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: required("R2_PUBLIC_BASE_URL")?,
        })
    }

    fn validate(&self) -> StorageResult<()> {
        if self.bucket_name.trim().is_empty() {
            return Err(StorageError::not_configured("bucket name is empty"));
        }
        let base = self.public_base_url.trim();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            return Err(StorageError::not_configured(format!(
                "public base URL {base:?} is not an http(s) URL"
            )));
        }
        Ok(())
    }
}

/// Uploads poster renditions to one R2 bucket.
#[derive(Clone)]
pub struct R2Client {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl R2Client {
    pub async fn new(config: R2Config) -> StorageResult<Self> {
        config.validate()?;

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

        Ok(Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_base_url: config.public_base_url.trim().trim_end_matches('/').to_string(),
        })
    }

    pub async fn from_env() -> StorageResult<Self> {
        Self::new(R2Config::from_env()?).await
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key.trim_start_matches('/'))
    }
}

fn check_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|seg| seg.is_empty() || seg == "..") {
        return Err(StorageError::invalid_key(key));
    }
    Ok(())
}

#[async_trait]
impl StoragePublisher for R2Client {
    async fn upload(&self, bytes: Vec<u8>, key: &str, options: UploadOptions) -> StorageResult<String> {
        check_key(key)?;
        debug!(key = %key, bytes = bytes.len(), content_type = %options.content_type, "Uploading poster object");

        let request = options.metadata.iter().fold(
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(key)
                .body(ByteStream::from(bytes))
                .content_type(&options.content_type)
                .cache_control(CACHE_CONTROL),
            |request, (k, v)| request.metadata(k, v),
        );

        if let Err(e) = request.send().await {
            let status = e.raw_response().map(|r| r.status().as_u16());
            return Err(StorageError::from_status(key, status, DisplayErrorContext(&e).to_string()));
        }

        let url = self.public_url(key);
        info!(key = %key, url = %url, "Published poster object");
        Ok(url)
    }
}
