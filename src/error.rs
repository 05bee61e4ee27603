use thiserror::Error;

/// Errors reported by an asset store for anything other than "absent" or
/// "not modified" - those two are ordinary [`FetchResult`](crate::store::FetchResult)
/// variants, never errors.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store rejected the request (4xx-equivalent). Not retryable.
    #[error("store rejected {operation} for {key}: {code}")]
    Client {
        key: String,
        operation: &'static str,
        code: String,
    },

    /// The store was unreachable or failed server-side. Retryable by the
    /// caller's policy; this crate does not retry.
    #[error("store unavailable during {operation} for {key}: {message}")]
    Upstream {
        key: String,
        operation: &'static str,
        message: String,
    },

    /// Presigning a URL failed before any request was sent.
    #[error("failed to presign {key}: {message}")]
    Sign { key: String, message: String },

    /// A local filesystem read failed for a reason other than absence.
    #[error("local read failed for {path}: {message}")]
    Local { path: String, message: String },
}

impl StoreError {
    /// Whether a caller could reasonably retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Upstream { .. })
    }
}

/// Errors from the tag-search collaborator.
#[derive(Debug, Error)]
pub enum SearchError {
    /// The document store query failed.
    #[error("tag query failed: {0}")]
    Query(#[from] mongodb::error::Error),
}
