//! Report bundle discovery.
//!
//! A report bundle is a top-level "folder" of the bucket that contains an
//! `index.html` entry file. [`ReportCatalog::list`] discovers bundles with one
//! delimiter listing followed by one existence probe per folder, then orders
//! them newest first.
//!
//! # Limits
//!
//! Only the first page of the folder listing is read. Buckets with more
//! top-level folders than the store returns in one page are truncated; the
//! listing reports this as [`CatalogStatus::Truncated`] instead of following
//! continuation tokens.
//!
//! Listing failures never propagate. The caller receives an empty catalog
//! with [`CatalogStatus::Unavailable`], and [`CatalogMetrics`] records the
//! failure so operators can tell "no reports" from "listing failed".
//!
//! Each store call has its own deadline, and the listing as a whole runs
//! under a separate budget. A listing that overruns the budget is abandoned
//! and reported as unavailable.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::store::{ListRequest, ObjectStore, ObjectSummary, StoreError, with_deadline};

/// Entry file whose presence marks a folder as a report bundle.
pub const ENTRY_FILE: &str = "index.html";

/// Separator used to emulate folders over the flat key space.
pub const DELIMITER: &str = "/";

/// One discovered report bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDescriptor {
    /// Folder name, also the routable report name. Never empty, no trailing slash.
    pub key: String,
    /// Size of the entry file in bytes.
    pub entry_object_size: u64,
    /// Last-modified time of the entry file.
    pub last_modified: DateTime<Utc>,
    /// Label shown on the dashboard.
    pub display_name: String,
}

impl ReportDescriptor {
    /// Build a descriptor from a folder key and its entry-file summary.
    ///
    /// `fallback_time` is used when the store omits the timestamp.
    #[must_use]
    pub fn from_entry(key: String, entry: &ObjectSummary, fallback_time: DateTime<Utc>) -> Self {
        Self {
            display_name: key.clone(),
            key,
            entry_object_size: entry.size,
            last_modified: entry.last_modified.unwrap_or(fallback_time),
        }
    }

    /// Path of the bundle's entry file, relative to the gateway root.
    #[must_use]
    pub fn entry_path(&self) -> String {
        format!("/report/{}/{ENTRY_FILE}", crate::format::encode_key_path(&self.key))
    }
}

/// How complete a catalog listing is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogStatus {
    /// Every top-level folder was examined.
    Complete,
    /// The store had more folders than fit in one page.
    Truncated,
    /// The folder listing itself failed; the catalog is empty.
    Unavailable {
        /// Failure description.
        reason: String,
    },
}

/// Result of [`ReportCatalog::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogListing {
    /// Discovered bundles, newest first; ties keep discovery order.
    pub reports: Vec<ReportDescriptor>,
    /// Completeness of the listing.
    pub status: CatalogStatus,
}

impl CatalogListing {
    fn unavailable(reason: String) -> Self {
        Self {
            reports: Vec::new(),
            status: CatalogStatus::Unavailable { reason },
        }
    }

    /// The listing failure, if the catalog could not be read.
    #[must_use]
    pub fn failure(&self) -> Option<ViewerError> {
        match &self.status {
            CatalogStatus::Unavailable { reason } => Some(ViewerError::CatalogUnavailable {
                reason: reason.clone(),
            }),
            CatalogStatus::Complete | CatalogStatus::Truncated => None,
        }
    }
}

/// Process-wide counters describing catalog health.
#[derive(Debug, Default)]
pub struct CatalogMetrics {
    listings: AtomicU64,
    unavailable: AtomicU64,
    timed_out: AtomicU64,
    truncated: AtomicU64,
    probe_failures: AtomicU64,
}

/// Point-in-time copy of [`CatalogMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMetricsSnapshot {
    /// Catalog listings attempted.
    pub listings: u64,
    /// Listings that failed and degraded to an empty catalog.
    pub unavailable: u64,
    /// Listings abandoned because they overran the request budget.
    pub timed_out: u64,
    /// Listings cut short by the single-page limit.
    pub truncated: u64,
    /// Entry-file probes that failed (folder skipped).
    pub probe_failures: u64,
}

impl CatalogMetrics {
    /// Read all counters.
    #[must_use]
    pub fn snapshot(&self) -> CatalogMetricsSnapshot {
        CatalogMetricsSnapshot {
            listings: self.listings.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            truncated: self.truncated.load(Ordering::Relaxed),
            probe_failures: self.probe_failures.load(Ordering::Relaxed),
        }
    }
}

/// Discovers report bundles in the bucket.
#[derive(Debug, Clone)]
pub struct ReportCatalog {
    store: Arc<dyn ObjectStore>,
    probe_concurrency: usize,
    store_timeout: Duration,
    list_budget: Duration,
    metrics: Arc<CatalogMetrics>,
}

impl ReportCatalog {
    /// Create a catalog over `store` with explicit limits.
    ///
    /// `store_timeout` bounds each store call; `list_budget` bounds a whole
    /// [`list`](Self::list).
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        probe_concurrency: usize,
        store_timeout: Duration,
        list_budget: Duration,
    ) -> Self {
        Self {
            store,
            probe_concurrency: probe_concurrency.max(1),
            store_timeout,
            list_budget,
            metrics: Arc::new(CatalogMetrics::default()),
        }
    }

    /// Create a catalog using the limits from `config`.
    #[must_use]
    pub fn from_config(store: Arc<dyn ObjectStore>, config: &ViewerConfig) -> Self {
        Self::new(
            store,
            config.probe_concurrency,
            config.store_timeout(),
            config.request_timeout(),
        )
    }

    /// Name of the bucket being cataloged.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.store.bucket()
    }

    /// Health counters shared by all clones of this catalog.
    #[must_use]
    pub fn metrics(&self) -> &Arc<CatalogMetrics> {
        &self.metrics
    }

    /// List the report bundles, newest first.
    ///
    /// Finishes within the listing budget. On expiry the partial work is
    /// dropped and the listing is [`CatalogStatus::Unavailable`].
    pub async fn list(&self) -> CatalogListing {
        self.metrics.listings.fetch_add(1, Ordering::Relaxed);

        match tokio::time::timeout(self.list_budget, self.list_unbounded()).await {
            Ok(listing) => listing,
            Err(_) => {
                self.metrics.unavailable.fetch_add(1, Ordering::Relaxed);
                self.metrics.timed_out.fetch_add(1, Ordering::Relaxed);
                warn!(
                    bucket = %self.bucket(),
                    budget_ms = self.list_budget.as_millis(),
                    "report catalog listing overran its budget, serving empty dashboard"
                );
                CatalogListing::unavailable(format!(
                    "listing did not finish within {:?}",
                    self.list_budget
                ))
            }
        }
    }

    async fn list_unbounded(&self) -> CatalogListing {
        let page = match with_deadline(
            "ListObjectsV2",
            self.store_timeout,
            self.store.list(ListRequest::folders(DELIMITER)),
        )
        .await
        {
            Ok(page) => page,
            Err(err) => {
                self.metrics.unavailable.fetch_add(1, Ordering::Relaxed);
                warn!(bucket = %self.bucket(), error = %err, "report catalog unavailable, serving empty dashboard");
                return CatalogListing::unavailable(err.to_string());
            }
        };

        let candidates: Vec<String> = page
            .common_prefixes
            .iter()
            .map(|p| p.strip_suffix(DELIMITER).unwrap_or(p.as_str()))
            .filter(|k| !k.is_empty())
            .map(str::to_owned)
            .collect();

        debug!(
            bucket = %self.bucket(),
            folders = candidates.len(),
            is_truncated = page.is_truncated,
            "listed top-level folders"
        );

        let fallback_time = Utc::now();

        // `buffered` yields in input order, so discovery order survives
        // concurrent probing.
        let probed: Vec<Option<ReportDescriptor>> = stream::iter(candidates)
            .map(|key| async move {
                let entry = self.probe_entry(&key).await;
                entry.map(|summary| ReportDescriptor::from_entry(key, &summary, fallback_time))
            })
            .buffered(self.probe_concurrency)
            .collect()
            .await;
        let mut reports: Vec<ReportDescriptor> = probed.into_iter().flatten().collect();

        reports.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

        let status = if page.is_truncated {
            self.metrics.truncated.fetch_add(1, Ordering::Relaxed);
            warn!(
                bucket = %self.bucket(),
                reports = reports.len(),
                "folder listing truncated to a single page, some reports are not shown"
            );
            CatalogStatus::Truncated
        } else {
            CatalogStatus::Complete
        };

        info!(bucket = %self.bucket(), reports = reports.len(), "report catalog listed");

        CatalogListing { reports, status }
    }

    /// Look for `<key>/index.html`. Missing entry files and failed probes both
    /// yield `None`.
    async fn probe_entry(&self, key: &str) -> Option<ObjectSummary> {
        let entry_key = format!("{key}{DELIMITER}{ENTRY_FILE}");
        let result: Result<_, StoreError> = with_deadline(
            "ListObjectsV2",
            self.store_timeout,
            self.store.list(ListRequest::probe(entry_key.clone())),
        )
        .await;

        match result {
            Ok(page) => {
                let found = page.objects.into_iter().find(|o| o.key == entry_key);
                if found.is_none() {
                    debug!(folder = %key, "folder has no entry file, skipping");
                }
                found
            }
            Err(err) => {
                self.metrics.probe_failures.fetch_add(1, Ordering::Relaxed);
                debug!(folder = %key, error = %err, "entry file probe failed, skipping folder");
                None
            }
        }
    }
}
