//! S3-backed implementation of [`AssetStore`].
//!
//! Wraps an `aws_sdk_s3::Client` with a bucket and key prefix, and
//! normalizes the SDK's error surface into the crate taxonomy: absence and
//! precondition matches become [`FetchResult`] variants, everything else a
//! [`StoreError`] classified as client (non-retryable) or upstream
//! (retryable).

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;

use super::{AssetBody, AssetMetadata, AssetStore, FetchOptions, FetchResult, SignedUrlOptions};
use crate::error::StoreError;

/// S3-backed asset store.
///
/// The logical asset key is concatenated with the configured prefix to form
/// the object key. The client's connection pool lives for the process
/// lifetime; the store itself is cheap to clone.
#[derive(Clone)]
pub struct S3AssetStore {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3AssetStore {
    /// Create a store for the given bucket with no key prefix.
    pub fn new(client: Client, bucket: String) -> Self {
        Self {
            client,
            bucket,
            prefix: String::new(),
        }
    }

    /// Set the key prefix prepended to every logical key.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Get the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Physical object key for a logical asset key.
    fn object_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn fetch(&self, key: &str, options: FetchOptions) -> Result<FetchResult, StoreError> {
        let mut request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.object_key(key));

        if let Some(etag) = &options.if_none_match {
            request = request.if_none_match(etag);
        }
        if let Some(range) = &options.range {
            request = request.range(range.header_value());
        }

        let output = match request.send().await {
            Ok(output) => output,
            Err(err) => {
                // A matched If-None-Match surfaces as an HTTP 304 error in
                // the SDK; it is an ordinary result here, not an error.
                let status = err.raw_response().map(|r| r.status().as_u16());
                if status == Some(304) {
                    return Ok(FetchResult::NotModified);
                }

                let is_no_such_key = err
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if is_no_such_key {
                    return Ok(FetchResult::NotFound);
                }

                return match classify(key, "get", &err) {
                    Classified::NotFound => Ok(FetchResult::NotFound),
                    Classified::Error(store_err) => Err(store_err),
                };
            }
        };

        let mut custom: Vec<(String, String)> = output
            .metadata()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        custom.sort();

        let metadata = AssetMetadata {
            content_length: output.content_length().unwrap_or(0).max(0) as u64,
            content_type: output.content_type().map(str::to_string),
            etag: output.e_tag().map(str::to_string),
            custom,
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Upstream {
                key: key.to_string(),
                operation: "get",
                message: e.to_string(),
            })?
            .into_bytes();

        Ok(FetchResult::Body(AssetBody { metadata, bytes }))
    }

    async fn probe(&self, key: &str) -> Result<Option<AssetMetadata>, StoreError> {
        let output = match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.object_key(key))
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let is_not_found = err
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);
                if is_not_found {
                    return Ok(None);
                }

                return match classify(key, "head", &err) {
                    Classified::NotFound => Ok(None),
                    Classified::Error(store_err) => Err(store_err),
                };
            }
        };

        let mut custom: Vec<(String, String)> = output
            .metadata()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        custom.sort();

        Ok(Some(AssetMetadata {
            content_length: output.content_length().unwrap_or(0).max(0) as u64,
            content_type: output.content_type().map(str::to_string),
            etag: output.e_tag().map(str::to_string),
            custom,
        }))
    }

    async fn signed_url(
        &self,
        key: &str,
        ttl: Duration,
        options: SignedUrlOptions,
    ) -> Result<String, StoreError> {
        let presigning = PresigningConfig::expires_in(ttl).map_err(|e| StoreError::Sign {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        let mut request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(self.object_key(key));

        if let Some(content_type) = options.response_content_type {
            request = request.response_content_type(content_type);
        }
        if let Some(disposition) = options.response_content_disposition {
            request = request.response_content_disposition(disposition);
        }

        // SigV4 presigning is a local computation over the credentials and
        // the request; no network round-trip is issued.
        let presigned = request
            .presigned(presigning)
            .await
            .map_err(|e| StoreError::Sign {
                key: key.to_string(),
                message: e.to_string(),
            })?;

        Ok(presigned.uri().to_string())
    }
}

// =============================================================================
// Error Classification
// =============================================================================

enum Classified {
    NotFound,
    Error(StoreError),
}

/// Classify an SDK error that is not a typed not-found/not-modified.
///
/// Layered like the object-size probe: raw status first, then the service
/// error code, then a string fallback for transports that expose neither.
/// Anything unrecognized becomes a [`StoreError`], never a silent absence.
fn classify<E>(key: &str, operation: &'static str, err: &SdkError<E>) -> Classified
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    let code = err
        .as_service_error()
        .and_then(|se| se.code())
        .map(str::to_string);

    if status == Some(404) || matches!(code.as_deref(), Some("NoSuchKey") | Some("NotFound")) {
        return Classified::NotFound;
    }

    let message = err
        .as_service_error()
        .and_then(|se| se.message())
        .map(str::to_string)
        .unwrap_or_else(|| err.to_string());

    match status {
        Some(status) if (400..500).contains(&status) => Classified::Error(StoreError::Client {
            key: key.to_string(),
            operation,
            code: code.unwrap_or_else(|| status.to_string()),
        }),
        _ => Classified::Error(StoreError::Upstream {
            key: key.to_string(),
            operation,
            message,
        }),
    }
}

// =============================================================================
// Client Construction
// =============================================================================

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
///
/// For AWS S3, pass `None` to use the default endpoint:
/// ```ignore
/// let client = create_s3_client(None, "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services usually require path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
