//! Integration tests for the tag search endpoint.
//!
//! Parameter validation happens before any document store round-trip, so
//! these tests run against a lazily-connected client that never dials out.
//! Query construction itself is unit-tested in `src/search`.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use asset_gateway::search::TagIndex;
use asset_gateway::{create_router, AppState, RouterConfig};

use super::test_utils::MockAssetStore;

/// Router with a search index whose client connects lazily; validation
/// rejections never reach the server.
async fn search_router() -> Router {
    let client = mongodb::Client::with_uri_str("mongodb://127.0.0.1:27017")
        .await
        .unwrap();
    let collection = client.database("scrapbook").collection("files");

    let state = AppState::new(MockAssetStore::new()).with_search(TagIndex::new(collection, 50));
    create_router(state, RouterConfig::new().with_tracing(false))
}

#[tokio::test]
async fn test_search_missing_q_is_400() {
    let router = search_router().await;

    let request = Request::builder()
        .uri("/search/tags")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "missing_query");
}

#[tokio::test]
async fn test_search_empty_q_is_400() {
    let router = search_router().await;

    let request = Request::builder()
        .uri("/search/tags?q=%20,%20")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_conflicting_bounds_is_400() {
    let router = search_router().await;

    let request = Request::builder()
        .uri("/search/tags?q=cat,orange&before=1700000000000&after=1600000000000")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "conflicting_bounds");
}

#[tokio::test]
async fn test_search_route_absent_without_index() {
    let state = AppState::new(MockAssetStore::new());
    let router = create_router(state, RouterConfig::new().with_tracing(false));

    let request = Request::builder()
        .uri("/search/tags?q=cat")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
