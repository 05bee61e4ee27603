//! # Asset Gateway
//!
//! A small HTTP gateway that serves binary assets (images) from S3 or
//! S3-compatible object storage, with correct byte-range and conditional
//! request handling, presigned-URL redirects, a local-filesystem serving
//! mode, and tag-based search over a document collection.
//!
//! ## Features
//!
//! - **Conditional GET**: `If-None-Match` is forwarded to the store and a
//!   precondition match comes back as an explicit 304, never as error-based
//!   control flow
//! - **Byte ranges**: `Range: bytes=N-[M]` requests probe the object size,
//!   then fetch and return exactly the requested bytes with a 206
//! - **Signed URLs**: time-limited SigV4 presigned URLs, served as 302
//!   redirects
//! - **Local fallback**: a configured directory can replace the object
//!   store, with path-traversal-safe resolution
//! - **Tag search**: `$all`-semantics tag matching over a MongoDB
//!   collection, newest first
//!
//! ## Architecture
//!
//! - [`store`] - the `AssetStore` trait, S3 implementation, and local tree
//! - [`search`] - tag query construction and the document index handle
//! - [`server`] - Axum handlers and router
//! - [`config`] - CLI and configuration types
//! - [`error`] - the store/search error taxonomy
//!
//! ## Example
//!
//! ```rust,no_run
//! use asset_gateway::{create_s3_client, AppState, RouterConfig, S3AssetStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client(None, "us-east-1").await;
//!     let store = S3AssetStore::new(client, "my-assets".to_string());
//!
//!     let state = AppState::new(store);
//!     let router = asset_gateway::create_router(state, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod config;
pub mod error;
pub mod search;
pub mod server;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{SearchError, StoreError};
pub use search::{normalize_tags, tag_filter, TagIndex, TagQuery, TimeBound};
pub use server::{
    create_router, AppState, AssetRejection, ErrorResponse, HealthResponse, RouterConfig,
    SearchRejection, TagSearchParams,
};
pub use store::{
    content_type_for, create_s3_client, AssetBody, AssetMetadata, AssetStore, ByteRange,
    FetchOptions, FetchResult, LocalTree, S3AssetStore, SignedUrlOptions,
};
