//! Tag-based document search.
//!
//! Thin wrapper over a MongoDB collection of file records. A query selects
//! documents whose `tags` array contains every requested tag and whose
//! `create_timestamp` (epoch milliseconds) satisfies a single time bound,
//! newest first, capped at a configured limit.

use std::time::{SystemTime, UNIX_EPOCH};

use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::Collection;

use crate::error::SearchError;

/// A single time bound on `create_timestamp`, in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBound {
    /// Records created at or before the instant (`$lte`).
    Before(i64),

    /// Records created at or after the instant (`$gte`).
    After(i64),
}

/// A normalized tag query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQuery {
    /// Lowercased, trimmed, non-empty tags; all must be present on a match.
    pub tags: Vec<String>,

    /// Bound on `create_timestamp`.
    pub bound: TimeBound,
}

/// Split a comma-separated tag list into normalized tags.
///
/// Tags are trimmed and lowercased; empty segments are dropped.
pub fn normalize_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Build the MongoDB filter document for a query.
pub fn tag_filter(query: &TagQuery) -> Document {
    let bound = match query.bound {
        TimeBound::Before(instant) => doc! { "$lte": instant },
        TimeBound::After(instant) => doc! { "$gte": instant },
    };

    doc! {
        "tags": { "$all": query.tags.clone() },
        "create_timestamp": bound,
    }
}

/// Current time in epoch milliseconds, the default upper bound.
pub fn epoch_ms_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

/// Handle to the file-record collection.
///
/// Cheap to clone; the underlying client's connection pool is shared and
/// lives for the process lifetime (the owning `main` shuts it down).
#[derive(Debug, Clone)]
pub struct TagIndex {
    collection: Collection<Document>,
    limit: i64,
}

impl TagIndex {
    /// Create an index over `collection` returning at most `limit` records
    /// per query.
    pub fn new(collection: Collection<Document>, limit: i64) -> Self {
        Self { collection, limit }
    }

    /// Get the configured result limit.
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Run a tag query, newest records first.
    pub async fn search(&self, query: &TagQuery) -> Result<Vec<Document>, SearchError> {
        let filter = tag_filter(query);

        let mut cursor = self
            .collection
            .find(filter)
            .sort(doc! { "create_timestamp": -1 })
            .limit(self.limit)
            .await?;

        let mut records = Vec::new();
        while let Some(record) = cursor.try_next().await? {
            records.push(record);
        }
        Ok(records)
    }
}

// =============================================================================
// Tests
// =============================================================================
