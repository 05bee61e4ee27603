//! Asset source abstraction.
//!
//! This module defines the contract the HTTP layer consumes: a source that
//! can fetch an asset (conditionally, or by byte range), probe its metadata
//! without transferring the body, and mint time-limited signed URLs.
//!
//! Two implementations exist:
//!
//! - [`S3AssetStore`] - S3 or S3-compatible object storage
//! - [`LocalTree`] - a directory on the local filesystem (no range or
//!   conditional support; used when a local root is configured)
//!
//! Absence and "not modified" are modeled as [`FetchResult`] variants, not
//! errors. [`crate::error::StoreError`] is reserved for failures the caller
//! cannot interpret as either.

mod local;
mod s3;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

pub use local::{content_type_for, LocalTree};
pub use s3::{create_s3_client, S3AssetStore};

// =============================================================================
// Request Types
// =============================================================================

/// An inclusive byte range within an object.
///
/// Both bounds are inclusive, matching the HTTP `Range` header convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    start: u64,
    end: u64,
}

impl ByteRange {
    /// Create a range from inclusive bounds. Returns `None` when `end < start`.
    pub fn new(start: u64, end: u64) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// First byte offset covered by the range.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Last byte offset covered by the range.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A range always covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Format as an HTTP `Range` header value: `bytes=start-end`.
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

/// Optional response-header overrides baked into a signed URL.
///
/// The overrides ride along as query parameters of the presigned request,
/// so the store serves the object with the given headers to whoever
/// follows the URL.
#[derive(Debug, Clone, Default)]
pub struct SignedUrlOptions {
    /// Override the `Content-Type` the store responds with.
    pub response_content_type: Option<String>,

    /// Override the `Content-Disposition` the store responds with.
    pub response_content_disposition: Option<String>,
}

impl SignedUrlOptions {
    /// Set the `Content-Type` override.
    pub fn with_response_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.response_content_type = Some(content_type.into());
        self
    }

    /// Set the `Content-Disposition` override.
    pub fn with_response_content_disposition(mut self, disposition: impl Into<String>) -> Self {
        self.response_content_disposition = Some(disposition.into());
        self
    }
}

/// Options for a fetch: an optional conditional etag and an optional range.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Client-supplied etag; a match yields [`FetchResult::NotModified`].
    pub if_none_match: Option<String>,

    /// Byte range to fetch instead of the full body.
    pub range: Option<ByteRange>,
}

impl FetchOptions {
    /// Set the conditional etag.
    pub fn with_if_none_match(mut self, etag: impl Into<String>) -> Self {
        self.if_none_match = Some(etag.into());
        self
    }

    /// Set the byte range.
    pub fn with_range(mut self, range: ByteRange) -> Self {
        self.range = Some(range);
        self
    }
}

// =============================================================================
// Result Types
// =============================================================================

/// Metadata describing a stored asset.
///
/// Produced by a probe or alongside a fetched body. Immutable once read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetMetadata {
    /// Total content length in bytes (for a ranged fetch, the part length).
    pub content_length: u64,

    /// Content type reported by the store, if any.
    pub content_type: Option<String>,

    /// Opaque entity tag reported by the store, if any.
    pub etag: Option<String>,

    /// User metadata the store attached, sorted by key.
    pub custom: Vec<(String, String)>,
}

/// A fetched asset body plus its metadata.
#[derive(Debug, Clone)]
pub struct AssetBody {
    pub metadata: AssetMetadata,
    pub bytes: Bytes,
}

/// Outcome of a fetch. Exactly one variant per request.
#[derive(Debug, Clone)]
pub enum FetchResult {
    /// The asset exists and its (possibly partial) body was transferred.
    Body(AssetBody),

    /// The conditional etag matched the stored object; no body transferred.
    NotModified,

    /// No object exists at the key.
    NotFound,
}

// =============================================================================
// Store Trait
// =============================================================================

/// A source of assets addressed by logical key.
///
/// Implementations translate their backend's errors into the
/// [`StoreError`] taxonomy and never coerce unrecognized failures into
/// [`FetchResult::NotFound`].
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Fetch an asset, optionally conditional on an etag and/or limited to
    /// a byte range.
    async fn fetch(&self, key: &str, options: FetchOptions) -> Result<FetchResult, StoreError>;

    /// Fetch metadata only, with no body transfer. `None` when absent.
    async fn probe(&self, key: &str) -> Result<Option<AssetMetadata>, StoreError>;

    /// Produce a time-limited URL granting anonymous read access to `key`.
    async fn signed_url(
        &self,
        key: &str,
        ttl: Duration,
        options: SignedUrlOptions,
    ) -> Result<String, StoreError>;
}

// =============================================================================
// Tests
// =============================================================================
