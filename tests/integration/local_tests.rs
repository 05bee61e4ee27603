//! Integration tests for the local filesystem serving mode.
//!
//! Tests verify:
//! - Files under the configured root are served with derived content types
//! - Traversal attempts fail closed to 404
//! - Local mode bypasses the object store entirely

use std::sync::atomic::Ordering;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use asset_gateway::store::LocalTree;
use asset_gateway::{create_router, AppState, RouterConfig};

use super::test_utils::MockAssetStore;

fn local_router(tree: LocalTree, store: MockAssetStore) -> Router {
    let state = AppState::new(store).with_local(tree);
    create_router(state, RouterConfig::new().with_tracing(false))
}

fn tree_with_photo() -> (tempfile::TempDir, LocalTree) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("photos")).unwrap();
    std::fs::write(dir.path().join("photos/cat.jpg"), b"local-jpeg-bytes").unwrap();
    let tree = LocalTree::new(dir.path()).unwrap();
    (dir, tree)
}

#[tokio::test]
async fn test_local_file_served_with_content_type() {
    let (_dir, tree) = tree_with_photo();
    let router = local_router(tree, MockAssetStore::new());

    let request = Request::builder()
        .uri("/img/photos/cat.jpg")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );

    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"local-jpeg-bytes");
}

#[tokio::test]
async fn test_local_missing_file_is_404() {
    let (_dir, tree) = tree_with_photo();
    let router = local_router(tree, MockAssetStore::new());

    let request = Request::builder()
        .uri("/img/photos/dog.jpg")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_local_traversal_is_404() {
    let (_dir, tree) = tree_with_photo();
    let router = local_router(tree, MockAssetStore::new());

    let request = Request::builder()
        .uri("/img/..%2F..%2Fetc%2Fpasswd")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_local_mode_bypasses_store() {
    let (_dir, tree) = tree_with_photo();

    // The store holds the same key; local mode must never consult it
    let store =
        MockAssetStore::new().with_object("photos/cat.jpg", b"s3-bytes".to_vec(), "\"s\"", "image/jpeg");
    let fetches = store.fetch_counter();
    let probes = store.probe_counter();
    let router = local_router(tree, store);

    let request = Request::builder()
        .uri("/img/photos/cat.jpg")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"local-jpeg-bytes");

    assert_eq!(fetches.load(Ordering::SeqCst), 0);
    assert_eq!(probes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_local_mode_has_no_signed_urls() {
    let (_dir, tree) = tree_with_photo();
    let router = local_router(tree, MockAssetStore::new());

    let request = Request::builder()
        .uri("/signed-url/photos/cat.jpg")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
