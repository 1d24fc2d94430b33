//! Amazon S3 implementation of [`ObjectStore`].
//!
//! [`S3ObjectStore`] issues `ListObjectsV2` and `GetObject` against a single
//! bucket. Credentials come from the default AWS provider chain (environment,
//! profile, instance or task role). A custom endpoint and path-style
//! addressing can be configured for S3-compatible stores.

use allure_viewer_core::{
    ListPage, ListRequest, ObjectStore, ObjectSummary, StoreError, StoredObject, ViewerConfig,
};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::primitives::DateTime as SmithyDateTime;
use aws_sdk_s3::types::Object;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Object store backed by one S3 bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Wrap an existing client.
    #[must_use]
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the viewer configuration and the default
    /// credential chain.
    pub async fn from_config(config: &ViewerConfig) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style);
        if let Some(ref endpoint) = config.endpoint_url {
            builder = builder.endpoint_url(endpoint);
        }

        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = config.endpoint_url.as_deref().unwrap_or("default"),
            path_style = config.force_path_style,
            "S3 object store configured"
        );

        Self::new(S3Client::from_conf(builder.build()), config.bucket.clone())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list(&self, request: ListRequest) -> Result<ListPage, StoreError> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix(request.prefix)
            .set_delimiter(request.delimiter)
            .set_max_keys(request.max_keys.map(max_keys_param))
            .send()
            .await
            .map_err(|e| StoreError::Service {
                operation: "ListObjectsV2",
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let page = page_from_output(&output);
        debug!(
            bucket = %self.bucket,
            prefixes = page.common_prefixes.len(),
            objects = page.objects.len(),
            is_truncated = page.is_truncated,
            "ListObjectsV2"
        );
        Ok(page)
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StoreError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(e) => {
                let err = e.into_service_error();
                return Err(if err.is_no_such_key() {
                    StoreError::NoSuchKey {
                        key: key.to_owned(),
                    }
                } else {
                    StoreError::Service {
                        operation: "GetObject",
                        message: DisplayErrorContext(&err).to_string(),
                    }
                });
            }
        };

        let last_modified = output.last_modified().and_then(to_chrono);
        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Body {
                key: key.to_owned(),
                message: DisplayErrorContext(&e).to_string(),
            })?
            .into_bytes();

        debug!(bucket = %self.bucket, key, size = body.len(), "GetObject");
        Ok(StoredObject {
            key: key.to_owned(),
            body,
            last_modified,
        })
    }
}

/// Clamp a page size to the SDK's `i32` parameter.
fn max_keys_param(max_keys: usize) -> i32 {
    i32::try_from(max_keys).unwrap_or(i32::MAX)
}

fn page_from_output(output: &ListObjectsV2Output) -> ListPage {
    ListPage {
        common_prefixes: output
            .common_prefixes()
            .iter()
            .filter_map(|cp| cp.prefix().map(str::to_owned))
            .collect(),
        objects: output.contents().iter().filter_map(summarize).collect(),
        is_truncated: output.is_truncated().unwrap_or(false),
    }
}

fn summarize(object: &Object) -> Option<ObjectSummary> {
    let key = object.key()?;
    Some(ObjectSummary {
        key: key.to_owned(),
        size: object
            .size()
            .and_then(|s| u64::try_from(s).ok())
            .unwrap_or(0),
        last_modified: object.last_modified().and_then(to_chrono),
    })
}

fn to_chrono(ts: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())
}
