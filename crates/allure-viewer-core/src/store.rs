//! Object-store seam.
//!
//! The catalog and the file proxy talk to the bucket exclusively through the
//! [`ObjectStore`] trait. The process entry point builds one implementation
//! (S3 in production, [`InMemoryStore`](crate::memory::InMemoryStore) in tests
//! and local development) and injects it as `Arc<dyn ObjectStore>`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Errors returned by object-store implementations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    /// The requested key does not exist.
    #[error("The specified key does not exist: {key}")]
    NoSuchKey {
        /// Missing key.
        key: String,
    },

    /// The call did not complete within its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Store operation name (e.g. `ListObjectsV2`).
        operation: &'static str,
        /// Deadline that elapsed.
        after: Duration,
    },

    /// The store rejected or failed the call.
    #[error("{operation} failed: {message}")]
    Service {
        /// Store operation name.
        operation: &'static str,
        /// Error detail reported by the store or the client.
        message: String,
    },

    /// The object body could not be read to completion.
    #[error("failed to read body of {key}: {message}")]
    Body {
        /// Key being read.
        key: String,
        /// Error detail.
        message: String,
    },
}

/// Parameters of a single-page listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    /// Only keys starting with this prefix are returned.
    pub prefix: Option<String>,
    /// Keys containing this delimiter after the prefix are rolled up into
    /// common prefixes.
    pub delimiter: Option<String>,
    /// Maximum number of keys plus common prefixes in the page.
    pub max_keys: Option<usize>,
}

impl ListRequest {
    /// Top-level "folders": delimiter listing without a prefix.
    #[must_use]
    pub fn folders(delimiter: &str) -> Self {
        Self {
            prefix: None,
            delimiter: Some(delimiter.to_owned()),
            max_keys: None,
        }
    }

    /// Existence probe: listing scoped to `key` capped at one result.
    #[must_use]
    pub fn probe(key: impl Into<String>) -> Self {
        Self {
            prefix: Some(key.into()),
            delimiter: None,
            max_keys: Some(1),
        }
    }
}

/// Metadata of one listed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    /// Full object key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last-modified timestamp, when the store reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// One page of listing results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Rolled-up prefixes, each ending with the delimiter.
    pub common_prefixes: Vec<String>,
    /// Objects directly matched by the listing.
    pub objects: Vec<ObjectSummary>,
    /// Whether the store has more results beyond this page.
    pub is_truncated: bool,
}

/// A fully buffered object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Object key.
    pub key: String,
    /// Object bytes.
    pub body: Bytes,
    /// Last-modified timestamp.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Key-addressed storage holding the report bundles of one bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Name of the bucket this store reads from.
    fn bucket(&self) -> &str;

    /// Return a single page of listing results. Continuation is not followed.
    async fn list(&self, request: ListRequest) -> Result<ListPage, StoreError>;

    /// Fetch and buffer one object.
    async fn get(&self, key: &str) -> Result<StoredObject, StoreError>;
}

/// Run a store call under a deadline, mapping expiry to [`StoreError::Timeout`].
pub async fn with_deadline<T, F>(
    operation: &'static str,
    after: Duration,
    call: F,
) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout { operation, after }),
    }
}
