//! In-memory [`ObjectStore`] used by tests and local development.
//!
//! Keys live in a `BTreeMap` so listings come back in lexicographic order,
//! like S3. Listing follows S3 semantics: prefix filter, delimiter roll-up
//! into common prefixes, and `max_keys` counting both objects and common
//! prefixes.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::store::{ListPage, ListRequest, ObjectStore, ObjectSummary, StoreError, StoredObject};

/// Default page size, matching S3's `ListObjectsV2` limit.
const DEFAULT_MAX_KEYS: usize = 1000;

#[derive(Debug, Clone)]
struct MemoryObject {
    body: Bytes,
    last_modified: Option<DateTime<Utc>>,
}

/// Thread-safe in-memory bucket.
#[derive(Debug)]
pub struct InMemoryStore {
    bucket: String,
    objects: RwLock<BTreeMap<String, MemoryObject>>,
}

impl InMemoryStore {
    /// Create an empty bucket.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Store an object stamped with the current time.
    pub fn put(&self, key: impl Into<String>, body: impl Into<Bytes>) {
        self.put_at(key, body, Some(Utc::now()));
    }

    /// Store an object with an explicit (or absent) last-modified timestamp.
    pub fn put_at(
        &self,
        key: impl Into<String>,
        body: impl Into<Bytes>,
        last_modified: Option<DateTime<Utc>>,
    ) {
        self.objects.write().insert(
            key.into(),
            MemoryObject {
                body: body.into(),
                last_modified,
            },
        );
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether the bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list(&self, request: ListRequest) -> Result<ListPage, StoreError> {
        let prefix = request.prefix.as_deref().unwrap_or("");
        let delimiter = request.delimiter.as_deref().unwrap_or("");
        let max_keys = request.max_keys.unwrap_or(DEFAULT_MAX_KEYS);

        let objects = self.objects.read();
        Ok(list_page(objects.iter(), prefix, delimiter, max_keys))
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let objects = self.objects.read();
        let obj = objects.get(key).ok_or_else(|| StoreError::NoSuchKey {
            key: key.to_owned(),
        })?;
        Ok(StoredObject {
            key: key.to_owned(),
            body: obj.body.clone(),
            last_modified: obj.last_modified,
        })
    }
}

/// Build one listing page from sorted `(key, object)` pairs.
fn list_page<'a>(
    objects: impl Iterator<Item = (&'a String, &'a MemoryObject)>,
    prefix: &str,
    delimiter: &str,
    max_keys: usize,
) -> ListPage {
    let use_delim = !delimiter.is_empty();
    let mut page = ListPage::default();
    let mut seen_prefixes = HashSet::new();
    let mut count = 0usize;

    for (key, obj) in objects {
        if !key.starts_with(prefix) {
            continue;
        }

        if use_delim {
            let after_prefix = &key[prefix.len()..];
            if let Some(pos) = after_prefix.find(delimiter) {
                let cp = format!("{prefix}{}{delimiter}", &after_prefix[..pos]);
                if seen_prefixes.contains(&cp) {
                    continue;
                }
                if count >= max_keys {
                    page.is_truncated = true;
                    break;
                }
                seen_prefixes.insert(cp.clone());
                page.common_prefixes.push(cp);
                count += 1;
                continue;
            }
        }

        if count >= max_keys {
            page.is_truncated = true;
            break;
        }

        page.objects.push(ObjectSummary {
            key: key.clone(),
            size: obj.body.len() as u64,
            last_modified: obj.last_modified,
        });
        count += 1;
    }

    page
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(keys: &[&str]) -> InMemoryStore {
        let store = InMemoryStore::new("reports");
        for key in keys {
            store.put(*key, Bytes::from_static(b"x"));
        }
        store
    }

    #[tokio::test]
    async fn test_should_roll_up_folders_with_delimiter() {
        let store = store_with(&[
            "run-a/index.html",
            "run-a/data/suites.json",
            "run-b/index.html",
            "loose.txt",
        ]);

        let page = store.list(ListRequest::folders("/")).await.expect("list");
        assert_eq!(page.common_prefixes, vec!["run-a/", "run-b/"]);
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.objects[0].key, "loose.txt");
        assert!(!page.is_truncated);
    }

    #[tokio::test]
    async fn test_should_cap_probe_at_one_result() {
        let store = store_with(&["run-a/index.html", "run-a/index.html.bak"]);

        let page = store
            .list(ListRequest::probe("run-a/index.html"))
            .await
            .expect("list");
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.objects[0].key, "run-a/index.html");
        assert_eq!(page.objects[0].size, 1);
        assert!(page.is_truncated);
    }

    #[tokio::test]
    async fn test_should_count_common_prefixes_toward_max_keys() {
        let store = store_with(&["a/1", "b/1", "c/1"]);
        let request = ListRequest {
            max_keys: Some(2),
            ..ListRequest::folders("/")
        };

        let page = store.list(request).await.expect("list");
        assert_eq!(page.common_prefixes, vec!["a/", "b/"]);
        assert!(page.is_truncated);
    }

    #[tokio::test]
    async fn test_should_get_object_bytes() {
        let store = InMemoryStore::new("reports");
        store.put("run-a/img/logo.png", vec![0x89, b'P', b'N', b'G']);

        let obj = store.get("run-a/img/logo.png").await.expect("get");
        assert_eq!(obj.body.as_ref(), &[0x89, b'P', b'N', b'G']);
        assert!(obj.last_modified.is_some());
    }

    #[tokio::test]
    async fn test_should_report_missing_key() {
        let store = InMemoryStore::new("reports");
        let err = store.get("nope").await.unwrap_err();
        assert!(matches!(err, StoreError::NoSuchKey { ref key } if key == "nope"));
    }

    #[test]
    fn test_should_track_len() {
        let store = InMemoryStore::new("reports");
        assert!(store.is_empty());
        store.put_at("k", Bytes::new(), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.bucket(), "reports");

        let page = tokio_test::block_on(store.list(ListRequest::default())).expect("list");
        assert_eq!(page.objects.len(), 1);
        assert_eq!(page.objects[0].last_modified, None);
    }
}
