//! Local filesystem fallback.
//!
//! Serves assets from a configured root directory instead of the object
//! store. Resolution is traversal-safe: absolute paths, `..` segments, and
//! symlink escapes all fail closed to [`FetchResult::NotFound`]. No range
//! or conditional support in this path.

use std::path::{Component, Path, PathBuf};

use bytes::Bytes;

use super::{AssetBody, AssetMetadata, FetchResult};
use crate::error::StoreError;

/// A directory tree serving assets by relative subpath.
#[derive(Debug, Clone)]
pub struct LocalTree {
    root: PathBuf,
}

impl LocalTree {
    /// Create a tree rooted at `root`.
    ///
    /// The root is canonicalized eagerly so containment checks compare
    /// against a stable path; a missing root is a configuration error.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let root = root.canonicalize().map_err(|e| StoreError::Local {
            path: root.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { root })
    }

    /// Get the canonicalized root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lexically resolve `subpath` beneath the root.
    ///
    /// Rejects any component that could climb out of the tree (`..`, an
    /// absolute root, a drive prefix) before touching the filesystem.
    fn resolve(&self, subpath: &str) -> Option<PathBuf> {
        let mut resolved = self.root.clone();
        for component in Path::new(subpath).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(resolved)
    }

    /// Serve the file at `subpath`, if it is a regular file inside the tree.
    ///
    /// Any escape attempt - lexical or via symlink - yields
    /// [`FetchResult::NotFound`], never the target's contents.
    pub async fn serve(&self, subpath: &str) -> Result<FetchResult, StoreError> {
        let Some(candidate) = self.resolve(subpath) else {
            return Ok(FetchResult::NotFound);
        };

        // Canonicalize collapses symlinks; re-check containment afterwards.
        let resolved = match tokio::fs::canonicalize(&candidate).await {
            Ok(path) => path,
            Err(_) => return Ok(FetchResult::NotFound),
        };
        if !resolved.starts_with(&self.root) {
            return Ok(FetchResult::NotFound);
        }

        let file_meta = match tokio::fs::metadata(&resolved).await {
            Ok(meta) => meta,
            Err(_) => return Ok(FetchResult::NotFound),
        };
        if !file_meta.is_file() {
            return Ok(FetchResult::NotFound);
        }

        let bytes = match tokio::fs::read(&resolved).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(FetchResult::NotFound)
            }
            Err(e) => {
                return Err(StoreError::Local {
                    path: subpath.to_string(),
                    message: e.to_string(),
                })
            }
        };

        let metadata = AssetMetadata {
            content_length: bytes.len() as u64,
            content_type: Some(content_type_for(subpath).to_string()),
            etag: None,
            custom: Vec::new(),
        };

        Ok(FetchResult::Body(AssetBody {
            metadata,
            bytes: Bytes::from(bytes),
        }))
    }
}

/// Content type derived from a path's file extension.
///
/// Defaults to `application/octet-stream` for unknown extensions.
pub fn content_type_for(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

// =============================================================================
// Tests
// =============================================================================
