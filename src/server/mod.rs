//! HTTP server layer for the asset gateway.
//!
//! This module provides the HTTP API over an [`AssetStore`](crate::store::AssetStore):
//! the asset protocol (conditional and ranged GETs), signed-URL redirects,
//! tag search, and the health check.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │   GET /img/{*path}   GET /signed-url/{*path}   GET /search/tags │
//! │                                                                 │
//! │      ┌───────────────────────┐   ┌─────────────────────────┐    │
//! │      │       handlers        │   │         routes          │    │
//! │      │ (protocol state machine)  │    (router + CORS)      │    │
//! │      └───────────────────────┘   └─────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    asset_handler, health_handler, parse_range, signed_url_handler, tag_search_handler, AppState,
    AssetRejection, ErrorResponse, HealthResponse, RangeSpec, SearchRejection, TagSearchParams,
    DEFAULT_CONTENT_TYPE, DEFAULT_SIGNED_URL_TTL,
};
pub use routes::{create_router, RouterConfig};
