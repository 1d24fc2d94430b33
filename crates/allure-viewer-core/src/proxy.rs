//! Serving single files out of a report bundle.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::debug;

use crate::config::ViewerConfig;
use crate::content_type::{TransportEncoding, resolve_content_type};
use crate::error::{ViewerError, ViewerResult};
use crate::store::{ObjectStore, StoreError, with_deadline};

/// A fetched object ready to be written into a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxiedFile {
    /// Object key the payload was read from.
    pub key: String,
    /// Raw object bytes.
    pub payload: Bytes,
    /// Resolved MIME type.
    pub content_type: &'static str,
    /// How the payload travels in the response body.
    pub transport_encoding: TransportEncoding,
}

impl ProxiedFile {
    /// Classify `payload` for transport.
    ///
    /// Text-like payloads are marked as UTF-8 text; a text-like payload that
    /// is not valid UTF-8 is marked as binary instead.
    #[must_use]
    pub fn new(key: String, payload: Bytes) -> Self {
        let content_type = resolve_content_type(&key);
        let mut transport_encoding = TransportEncoding::for_content_type(content_type);
        if transport_encoding == TransportEncoding::Identity && std::str::from_utf8(&payload).is_err() {
            transport_encoding = TransportEncoding::Base64;
        }
        Self {
            key,
            payload,
            content_type,
            transport_encoding,
        }
    }
}

/// Fetches objects from the bucket by key.
#[derive(Debug, Clone)]
pub struct FileProxy {
    store: Arc<dyn ObjectStore>,
    store_timeout: Duration,
}

impl FileProxy {
    /// Create a proxy over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// Create a proxy using the limits from `config`.
    #[must_use]
    pub fn from_config(store: Arc<dyn ObjectStore>, config: &ViewerConfig) -> Self {
        Self::new(store, config.store_timeout())
    }

    /// Fetch `key` and classify it for transport.
    pub async fn fetch(&self, key: &str) -> ViewerResult<ProxiedFile> {
        let object = with_deadline("GetObject", self.store_timeout, self.store.get(key))
            .await
            .map_err(|err| match err {
                StoreError::NoSuchKey { .. } => ViewerError::NotFound {
                    key: key.to_owned(),
                },
                other => ViewerError::Upstream { source: other },
            })?;

        let file = ProxiedFile::new(key.to_owned(), object.body);
        debug!(
            key,
            size = file.payload.len(),
            content_type = file.content_type,
            base64 = file.transport_encoding.is_base64(),
            "fetched report file"
        );
        Ok(file)
    }
}
