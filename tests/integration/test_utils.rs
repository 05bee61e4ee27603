//! Test utilities for integration tests.
//!
//! Provides a mock asset store that serves pre-configured objects and
//! tracks how often each operation is called, so tests can assert that the
//! ranged path issues exactly one probe and one fetch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use asset_gateway::error::StoreError;
use asset_gateway::store::{
    AssetBody, AssetMetadata, AssetStore, FetchOptions, FetchResult, SignedUrlOptions,
};

// =============================================================================
// Mock Objects
// =============================================================================

/// A stored object in the mock store.
#[derive(Clone)]
pub struct MockObject {
    pub data: Bytes,
    pub etag: Option<String>,
    pub content_type: Option<String>,
    pub custom: Vec<(String, String)>,
}

// =============================================================================
// Mock Asset Store
// =============================================================================

/// A mock asset store serving pre-configured objects.
///
/// Ranged fetches slice the stored bytes the way S3 does (end clamped to
/// the object length). Injected errors take precedence over lookups.
pub struct MockAssetStore {
    objects: HashMap<String, MockObject>,
    fetch_error: Option<StoreError>,
    probe_error: Option<StoreError>,
    fetch_count: Arc<AtomicUsize>,
    probe_count: Arc<AtomicUsize>,
}

impl MockAssetStore {
    pub fn new() -> Self {
        Self {
            objects: HashMap::new(),
            fetch_error: None,
            probe_error: None,
            fetch_count: Arc::new(AtomicUsize::new(0)),
            probe_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add an object with an etag and content type.
    pub fn with_object(
        mut self,
        key: impl Into<String>,
        data: Vec<u8>,
        etag: &str,
        content_type: &str,
    ) -> Self {
        self.objects.insert(
            key.into(),
            MockObject {
                data: Bytes::from(data),
                etag: Some(etag.to_string()),
                content_type: Some(content_type.to_string()),
                custom: Vec::new(),
            },
        );
        self
    }

    /// Add an object with custom user metadata.
    pub fn with_object_meta(
        mut self,
        key: impl Into<String>,
        data: Vec<u8>,
        etag: &str,
        content_type: &str,
        custom: Vec<(&str, &str)>,
    ) -> Self {
        self.objects.insert(
            key.into(),
            MockObject {
                data: Bytes::from(data),
                etag: Some(etag.to_string()),
                content_type: Some(content_type.to_string()),
                custom: custom
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        );
        self
    }

    /// Add an object with no etag and no content type.
    pub fn with_bare_object(mut self, key: impl Into<String>, data: Vec<u8>) -> Self {
        self.objects.insert(
            key.into(),
            MockObject {
                data: Bytes::from(data),
                etag: None,
                content_type: None,
                custom: Vec::new(),
            },
        );
        self
    }

    /// Fail every fetch with the given error.
    pub fn with_fetch_error(mut self, error: StoreError) -> Self {
        self.fetch_error = Some(error);
        self
    }

    /// Fail every probe with the given error.
    pub fn with_probe_error(mut self, error: StoreError) -> Self {
        self.probe_error = Some(error);
        self
    }

    /// Shared fetch counter, cloned out before the store moves into state.
    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetch_count)
    }

    /// Shared probe counter, cloned out before the store moves into state.
    pub fn probe_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.probe_count)
    }

    fn metadata_for(&self, object: &MockObject, content_length: u64) -> AssetMetadata {
        AssetMetadata {
            content_length,
            content_type: object.content_type.clone(),
            etag: object.etag.clone(),
            custom: object.custom.clone(),
        }
    }
}

#[async_trait]
impl AssetStore for MockAssetStore {
    async fn fetch(&self, key: &str, options: FetchOptions) -> Result<FetchResult, StoreError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.fetch_error {
            return Err(error.clone());
        }

        let Some(object) = self.objects.get(key) else {
            return Ok(FetchResult::NotFound);
        };

        if let (Some(client_etag), Some(etag)) = (&options.if_none_match, &object.etag) {
            if client_etag == etag {
                return Ok(FetchResult::NotModified);
            }
        }

        let bytes = match &options.range {
            Some(range) => {
                let len = object.data.len() as u64;
                let start = range.start().min(len) as usize;
                let end = (range.end() + 1).min(len) as usize;
                object.data.slice(start..end)
            }
            None => object.data.clone(),
        };

        let metadata = self.metadata_for(object, bytes.len() as u64);
        Ok(FetchResult::Body(AssetBody { metadata, bytes }))
    }

    async fn probe(&self, key: &str) -> Result<Option<AssetMetadata>, StoreError> {
        self.probe_count.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.probe_error {
            return Err(error.clone());
        }

        Ok(self
            .objects
            .get(key)
            .map(|object| self.metadata_for(object, object.data.len() as u64)))
    }

    async fn signed_url(
        &self,
        key: &str,
        ttl: Duration,
        _options: SignedUrlOptions,
    ) -> Result<String, StoreError> {
        // Presigning never checks existence; the handler probes first
        Ok(format!(
            "https://mock-store.example/{}?expires={}",
            key,
            ttl.as_secs()
        ))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Deterministic payload of `len` bytes for byte-exact assertions.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
