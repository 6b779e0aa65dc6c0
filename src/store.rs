use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{operation} {key}: {message}")]
pub struct StoreError {
    pub operation: &'static str,
    pub key: String,
    pub message: String,
}

impl StoreError {
    pub fn new(operation: &'static str, key: &str, message: impl Into<String>) -> Self {
        Self {
            operation,
            key: key.to_string(),
            message: message.into(),
        }
    }
}

/// Key/value blob store with HEAD/PUT semantics.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// `Ok(false)` when the object does not exist; any other failure is an error.
    async fn head_exists(&self, key: &str) -> Result<bool, StoreError>;

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), StoreError>;

    /// Public URL the object is served from, for logging.
    fn object_url(&self, key: &str) -> String;
}

/// Connection settings for an S3-compatible bucket.
#[derive(Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint_url: Option<String>,
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

pub struct S3Store {
    client: Client,
    bucket: String,
    region: String,
    endpoint_url: Option<String>,
}

impl S3Store {
    /// Builds a client from static credentials. No network traffic happens here.
    pub fn new(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            None,
            None,
            "img-publish",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &settings.endpoint_url {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: settings.bucket.clone(),
            region: settings.region.clone(),
            endpoint_url: settings.endpoint_url.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn head_exists(&self, key: &str) -> Result<bool, StoreError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.as_service_error().is_some_and(|e| e.is_not_found()) {
                    return Ok(false);
                }
                Err(StoreError::new(
                    "HEAD",
                    key,
                    DisplayErrorContext(&err).to_string(),
                ))
            }
        }
    }

    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
        cache_control: &str,
    ) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .cache_control(cache_control)
            .send()
            .await
            .map_err(|e| StoreError::new("PUT", key, DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }

    fn object_url(&self, key: &str) -> String {
        build_object_url(
            &self.bucket,
            &self.region,
            self.endpoint_url.as_deref(),
            key,
        )
    }
}

/// Virtual-hosted AWS URL, or path-style URL when a custom endpoint is set.
pub fn build_object_url(bucket: &str, region: &str, endpoint: Option<&str>, key: &str) -> String {
    match endpoint {
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
    }
}
