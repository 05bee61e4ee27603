//! HTTP request handlers for the asset gateway.
//!
//! This module contains the Axum handlers for serving assets, minting
//! signed URLs, tag search, and health checks.
//!
//! # Endpoints
//!
//! - `GET /img/{*path}` - Serve an asset (honors `Range` and `If-None-Match`)
//! - `GET /signed-url/{*path}` - Redirect to a presigned URL
//! - `GET /search/tags` - Tag-based document search
//! - `GET /health` - Health check endpoint

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{SearchError, StoreError};
use crate::search::{epoch_ms_now, normalize_tags, TagIndex, TagQuery, TimeBound};
use crate::store::{
    AssetBody, AssetStore, ByteRange, FetchOptions, FetchResult, LocalTree, SignedUrlOptions,
};

/// Content type used when the store reports none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Default validity window for signed URLs (1 hour).
pub const DEFAULT_SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to all handlers via Axum's State extractor.
///
/// Constructed once at startup and owned by the router; no globals.
pub struct AppState<S: AssetStore> {
    /// The object store serving asset bytes
    pub store: Arc<S>,

    /// Local filesystem tree; when set, `/img` bypasses the store entirely
    pub local: Option<Arc<LocalTree>>,

    /// Tag search index; when absent the search route is not registered
    pub search: Option<Arc<TagIndex>>,

    /// Validity window for presigned URLs
    pub signed_url_ttl: Duration,

    /// Whether malformed `Range` headers yield 416 instead of falling
    /// through to a full conditional fetch
    pub strict_ranges: bool,
}

impl<S: AssetStore> AppState<S> {
    /// Create state around an asset store with default policies.
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
            local: None,
            search: None,
            signed_url_ttl: DEFAULT_SIGNED_URL_TTL,
            strict_ranges: false,
        }
    }

    /// Serve `/img` from a local tree instead of the object store.
    pub fn with_local(mut self, tree: LocalTree) -> Self {
        self.local = Some(Arc::new(tree));
        self
    }

    /// Enable the tag search endpoint.
    pub fn with_search(mut self, index: TagIndex) -> Self {
        self.search = Some(Arc::new(index));
        self
    }

    /// Set the signed URL validity window.
    pub fn with_signed_url_ttl(mut self, ttl: Duration) -> Self {
        self.signed_url_ttl = ttl;
        self
    }

    /// Respond 416 to malformed `Range` headers instead of ignoring them.
    pub fn with_strict_ranges(mut self, strict: bool) -> Self {
        self.strict_ranges = strict;
        self
    }
}

impl<S: AssetStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            local: self.local.clone(),
            search: self.search.clone(),
            signed_url_ttl: self.signed_url_ttl,
            strict_ranges: self.strict_ranges,
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for the tag search endpoint.
#[derive(Debug, Deserialize)]
pub struct TagSearchParams {
    /// Comma-separated tag list (required)
    #[serde(default)]
    pub q: Option<String>,

    /// Upper bound on create_timestamp, epoch milliseconds
    #[serde(default)]
    pub before: Option<i64>,

    /// Lower bound on create_timestamp, epoch milliseconds
    #[serde(default)]
    pub after: Option<i64>,
}

/// A parsed `Range` request header: `bytes=<start>-[<end>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    /// First requested byte offset
    pub start: u64,

    /// Last requested byte offset; `None` when open-ended
    pub end: Option<u64>,
}

/// Parse a `Range` header value.
///
/// Accepts a single `bytes=<start>-[<end>]` range. Multi-ranges, suffix
/// ranges (`bytes=-N`), inverted bounds, and other units are all treated as
/// malformed (`None`); policy decides whether that means 416 or a full
/// fetch.
pub fn parse_range(value: &str) -> Option<RangeSpec> {
    let spec = value.strip_prefix("bytes=")?;
    if spec.contains(',') {
        return None;
    }

    let (start, end) = spec.split_once('-')?;
    let start: u64 = start.trim().parse().ok()?;

    let end = end.trim();
    let end = if end.is_empty() {
        None
    } else {
        Some(end.parse::<u64>().ok()?)
    };

    if let Some(end) = end {
        if end < start {
            return None;
        }
    }

    Some(RangeSpec { start, end })
}

/// Resolve a parsed range against the object's total length.
///
/// An open end becomes `total - 1`; an explicit end is clamped to it.
/// `None` when the range starts at or past the end of the object.
fn resolve_range(spec: RangeSpec, total: u64) -> Option<ByteRange> {
    if total == 0 || spec.start >= total {
        return None;
    }
    let end = spec.end.map_or(total - 1, |end| end.min(total - 1));
    ByteRange::new(spec.start, end)
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for all error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "not_found", "store_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Terminal outcomes of the asset protocol that are not a body transfer.
///
/// Converted to an HTTP response at the handler boundary; store failures
/// are logged with their diagnostic detail but never leaked to the client.
#[derive(Debug)]
pub enum AssetRejection {
    /// No object at the key (or local file absent / escape attempt)
    NotFound,

    /// The requested range cannot be satisfied; `total` feeds the
    /// `Content-Range: bytes */{total}` header when known
    RangeNotSatisfiable { total: Option<u64> },

    /// A store failure in fetch position
    Store(StoreError),

    /// A retryable store failure in probe position
    Upstream(StoreError),
}

impl IntoResponse for AssetRejection {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AssetRejection::NotFound => {
                (StatusCode::NOT_FOUND, "not_found", "Not found".to_string())
            }

            AssetRejection::RangeNotSatisfiable { .. } => (
                StatusCode::RANGE_NOT_SATISFIABLE,
                "range_not_satisfiable",
                "Requested range not satisfiable".to_string(),
            ),

            AssetRejection::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "Internal server error".to_string(),
            ),

            AssetRejection::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "upstream_error",
                "Upstream store unavailable".to_string(),
            ),
        };

        // Log errors based on severity; diagnostic detail stays server-side
        match &self {
            AssetRejection::NotFound => {
                debug!(status = status.as_u16(), "asset not found");
            }
            AssetRejection::RangeNotSatisfiable { total } => {
                warn!(status = status.as_u16(), total = ?total, "unsatisfiable range");
            }
            AssetRejection::Store(err) | AssetRejection::Upstream(err) => {
                error!(
                    status = status.as_u16(),
                    retryable = err.is_retryable(),
                    "store error: {}",
                    err
                );
            }
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        let mut response = (status, Json(error_response)).into_response();

        if let AssetRejection::RangeNotSatisfiable { total: Some(total) } = self {
            if let Ok(value) = HeaderValue::from_str(&format!("bytes */{}", total)) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }

        response
    }
}

/// Rejections from the tag search endpoint.
#[derive(Debug)]
pub enum SearchRejection {
    /// The `q` parameter is missing or normalizes to nothing
    MissingQuery,

    /// Both `before` and `after` were supplied
    ConflictingBounds,

    /// No search index is configured
    Unavailable,

    /// The document store query failed
    Index(SearchError),
}

impl IntoResponse for SearchRejection {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            SearchRejection::MissingQuery => (
                StatusCode::BAD_REQUEST,
                "missing_query",
                "Query parameter 'q' is required".to_string(),
            ),

            SearchRejection::ConflictingBounds => (
                StatusCode::BAD_REQUEST,
                "conflicting_bounds",
                "'before' and 'after' are mutually exclusive".to_string(),
            ),

            SearchRejection::Unavailable => (
                StatusCode::NOT_FOUND,
                "search_unavailable",
                "Tag search is not configured".to_string(),
            ),

            SearchRejection::Index(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "search_error",
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            if let SearchRejection::Index(err) = &self {
                error!(status = status.as_u16(), "search error: {}", err);
            }
        } else {
            debug!(status = status.as_u16(), "search rejected: {}", message);
        }

        let error_response = ErrorResponse::with_status(error_type, message, status);
        (status, Json(error_response)).into_response()
    }
}

// =============================================================================
// Asset Handler
// =============================================================================

/// Handle asset requests.
///
/// # Endpoint
///
/// `GET /img/{*path}`
///
/// # Request Headers
///
/// - `Range: bytes=<start>-[<end>]` - fetch a byte subrange (single range)
/// - `If-None-Match: <etag>` - conditional fetch
///
/// # Response
///
/// - `200 OK`: full body with `Content-Type`, `Content-Length`, `ETag`, and
///   any custom metadata headers the store attached
/// - `206 Partial Content`: the requested bytes with `Content-Range`
/// - `304 Not Modified`: the conditional etag matched; empty body
/// - `404 Not Found`: no object at the key
/// - `416 Range Not Satisfiable`: range starts past the end of the object
///   (or, in strict mode, could not be parsed)
/// - `500 Internal Server Error`: unclassified store failure
/// - `502 Bad Gateway`: the store was unreachable while probing
pub async fn asset_handler<S: AssetStore>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AssetRejection> {
    // A configured local tree replaces the object store outright.
    if let Some(tree) = &state.local {
        return serve_from_tree(tree, &path).await;
    }

    if let Some(value) = headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
        match parse_range(value) {
            Some(spec) => return ranged_request(&state, &path, spec).await,
            None if state.strict_ranges => {
                return Err(AssetRejection::RangeNotSatisfiable { total: None });
            }
            None => {
                debug!(range = value, "ignoring malformed range header");
            }
        }
    }

    let if_none_match = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    conditional_request(&state, &path, if_none_match).await
}

/// Ranged path: probe for the total size, then fetch exactly the resolved
/// range. One probe, at most one fetch.
async fn ranged_request<S: AssetStore>(
    state: &AppState<S>,
    key: &str,
    spec: RangeSpec,
) -> Result<Response, AssetRejection> {
    let metadata = state.store.probe(key).await.map_err(probe_rejection)?;
    let Some(metadata) = metadata else {
        return Err(AssetRejection::NotFound);
    };

    let total = metadata.content_length;
    let Some(range) = resolve_range(spec, total) else {
        return Err(AssetRejection::RangeNotSatisfiable { total: Some(total) });
    };

    let options = FetchOptions::default().with_range(range);
    match state.store.fetch(key, options).await {
        Ok(FetchResult::Body(body)) => Ok(partial_response(range, total, body)),
        Ok(FetchResult::NotFound) => Err(AssetRejection::NotFound),
        // Unconditional fetch; a 304 here means the object raced away from
        // under us, surface it as the store reported it
        Ok(FetchResult::NotModified) => Ok(not_modified_response()),
        Err(err) => Err(AssetRejection::Store(err)),
    }
}

/// Conditional path: a single fetch carrying the client's etag, if any.
async fn conditional_request<S: AssetStore>(
    state: &AppState<S>,
    key: &str,
    if_none_match: Option<String>,
) -> Result<Response, AssetRejection> {
    let mut options = FetchOptions::default();
    if let Some(etag) = if_none_match {
        options = options.with_if_none_match(etag);
    }

    match state.store.fetch(key, options).await {
        Ok(FetchResult::Body(body)) => Ok(full_response(body)),
        Ok(FetchResult::NotModified) => Ok(not_modified_response()),
        Ok(FetchResult::NotFound) => Err(AssetRejection::NotFound),
        Err(err) => Err(AssetRejection::Store(err)),
    }
}

/// Local filesystem path: full body only, no range or conditional support.
async fn serve_from_tree(tree: &LocalTree, path: &str) -> Result<Response, AssetRejection> {
    match tree.serve(path).await {
        Ok(FetchResult::Body(body)) => Ok(full_response(body)),
        Ok(FetchResult::NotModified) => Ok(not_modified_response()),
        Ok(FetchResult::NotFound) => Err(AssetRejection::NotFound),
        Err(err) => Err(AssetRejection::Store(err)),
    }
}

/// Map a probe failure: upstream failures are distinguished as 502 rather
/// than collapsed into absence.
fn probe_rejection(err: StoreError) -> AssetRejection {
    if err.is_retryable() {
        AssetRejection::Upstream(err)
    } else {
        AssetRejection::Store(err)
    }
}

// =============================================================================
// Response Builders
// =============================================================================

/// Build a 200 response carrying the full body and its metadata headers.
fn full_response(body: AssetBody) -> Response {
    let content_type = body
        .metadata
        .content_type
        .as_deref()
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, body.bytes.len());

    if let Some(etag) = &body.metadata.etag {
        builder = builder.header(header::ETAG, etag.as_str());
    }

    // Custom metadata keys are emitted under their stored names; anything
    // that is not a valid header name is skipped, not fatal.
    for (name, value) in &body.metadata.custom {
        if let (Ok(name), Ok(value)) = (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            builder = builder.header(name, value);
        }
    }

    builder.body(Body::from(body.bytes)).unwrap()
}

/// Build a 206 response carrying the requested byte range.
fn partial_response(range: ByteRange, total: u64, body: AssetBody) -> Response {
    let content_type = body
        .metadata
        .content_type
        .as_deref()
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    let mut builder = Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, body.bytes.len())
        .header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", range.start(), range.end(), total),
        );

    if let Some(etag) = &body.metadata.etag {
        builder = builder.header(header::ETAG, etag.as_str());
    }

    builder.body(Body::from(body.bytes)).unwrap()
}

/// Build a 304 response with no body.
fn not_modified_response() -> Response {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .body(Body::empty())
        .unwrap()
}

// =============================================================================
// Signed URL Handler
// =============================================================================

/// Handle signed URL requests.
///
/// # Endpoint
///
/// `GET /signed-url/{*path}`
///
/// # Response
///
/// - `302 Found`: `Location` carries a presigned URL valid for the
///   configured TTL
/// - `404 Not Found`: no object at the key (or local mode, which has no
///   signer)
/// - `500 Internal Server Error`: probe or signing failure
/// - `502 Bad Gateway`: the store was unreachable while probing
pub async fn signed_url_handler<S: AssetStore>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
) -> Result<Response, AssetRejection> {
    if state.local.is_some() {
        return Err(AssetRejection::NotFound);
    }

    match state.store.probe(&path).await {
        Ok(None) => Err(AssetRejection::NotFound),
        Ok(Some(_)) => {
            let url = state
                .store
                .signed_url(&path, state.signed_url_ttl, SignedUrlOptions::default())
                .await
                .map_err(AssetRejection::Store)?;

            let location =
                HeaderValue::from_str(&url).map_err(|_| {
                    AssetRejection::Store(StoreError::Sign {
                        key: path.clone(),
                        message: "presigned URL is not a valid header value".to_string(),
                    })
                })?;

            Ok(Response::builder()
                .status(StatusCode::FOUND)
                .header(header::LOCATION, location)
                .body(Body::empty())
                .unwrap())
        }
        Err(err) => Err(probe_rejection(err)),
    }
}

// =============================================================================
// Search Handler
// =============================================================================

/// Handle tag search requests.
///
/// # Endpoint
///
/// `GET /search/tags?q=<comma-tags>&before=<epoch-ms>|after=<epoch-ms>`
///
/// # Response
///
/// `200 OK` with a JSON array of matching records, newest first, capped at
/// the configured limit. Records match when their `tags` field contains
/// every requested tag and `create_timestamp` satisfies the bound (default:
/// at or before now).
///
/// # Errors
///
/// - `400 Bad Request`: missing `q`, or both `before` and `after`
/// - `500 Internal Server Error`: document store failure
pub async fn tag_search_handler<S: AssetStore>(
    State(state): State<AppState<S>>,
    Query(params): Query<TagSearchParams>,
) -> Result<Json<Vec<Document>>, SearchRejection> {
    let Some(index) = &state.search else {
        return Err(SearchRejection::Unavailable);
    };

    let tags = normalize_tags(params.q.as_deref().unwrap_or(""));
    if tags.is_empty() {
        return Err(SearchRejection::MissingQuery);
    }

    let bound = match (params.before, params.after) {
        (Some(_), Some(_)) => return Err(SearchRejection::ConflictingBounds),
        (Some(before), None) => TimeBound::Before(before),
        (None, Some(after)) => TimeBound::After(after),
        (None, None) => TimeBound::Before(epoch_ms_now()),
    };

    let records = index
        .search(&TagQuery { tags, bound })
        .await
        .map_err(SearchRejection::Index)?;

    Ok(Json(records))
}

// =============================================================================
// Health Handler
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
