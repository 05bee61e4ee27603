//! Router configuration for the asset gateway.
//!
//! This module defines the HTTP routes and applies the CORS and tracing
//! middleware.
//!
//! # Route Structure
//!
//! ```text
//! /health                 - Health check
//! /img/{*path}            - Asset endpoint (Range / If-None-Match aware)
//! /signed-url/{*path}     - Redirect to a presigned URL
//! /search/tags            - Tag search (only when an index is configured)
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{
    asset_handler, health_handler, signed_url_handler, tag_search_handler, AppState,
};
use crate::store::AssetStore;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration with the defaults: CORS allows any
    /// origin and tracing is enabled.
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests. Don't call
    /// this method to allow any origin.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// The search route is registered only when the state carries a tag index.
pub fn create_router<S>(state: AppState<S>, config: RouterConfig) -> Router
where
    S: AssetStore + 'static,
{
    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/img/{*path}", get(asset_handler::<S>))
        .route("/signed-url/{*path}", get(signed_url_handler::<S>));

    if state.search.is_some() {
        router = router.route("/search/tags", get(tag_search_handler::<S>));
    }

    let router = router.with_state(state).layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
///
/// The extra allowed headers mirror the viewer clients this gateway serves,
/// which declare resize hints (`x-width`, `x-height`) and a range override
/// (`x-range`) even though the gateway does not act on them.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-width"),
            HeaderName::from_static("x-height"),
            HeaderName::from_static("x-range"),
        ])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => {
            // No origins allowed - this effectively disables CORS
            cors
        }
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
