//! Core logic for the Allure report viewer.
//!
//! The viewer is a small gateway that sits behind an authenticating load
//! balancer and exposes static test-report bundles stored in an object store.
//! This crate holds everything that is independent of the HTTP transport:
//!
//! - **Configuration** ([`config`]): [`ViewerConfig`] loaded from environment
//!   variables.
//! - **Errors** ([`error`]): the [`ViewerError`] taxonomy shared by all layers.
//! - **Store seam** ([`store`]): the [`ObjectStore`] trait plus an in-memory
//!   implementation in [`memory`].
//! - **Content typing** ([`content_type`]): extension to MIME resolution and
//!   text/binary classification.
//! - **Formatting** ([`format`]): byte sizes, HTML escaping, timestamps.
//! - **Catalog** ([`catalog`]): discovery of report bundles.
//! - **Rendering** ([`render`]): the dashboard HTML page.
//! - **Proxy** ([`proxy`]): fetching a single file out of a bundle.
//!
//! # Architecture
//!
//! ```text
//! Router (allure-viewer-http)
//!   |-- "/"            -> ReportCatalog::list -> render_dashboard
//!   `-- "/report/..."  -> FileProxy::fetch
//!                              |
//!                              v
//!                     Arc<dyn ObjectStore> (S3 or in-memory)
//! ```

pub mod catalog;
pub mod config;
pub mod content_type;
pub mod error;
pub mod format;
pub mod memory;
pub mod proxy;
pub mod render;
pub mod store;

pub use catalog::{
    CatalogListing, CatalogMetrics, CatalogMetricsSnapshot, CatalogStatus, ReportCatalog,
    ReportDescriptor,
};
pub use config::{ConfigError, ViewerConfig};
pub use content_type::{TransportEncoding, resolve_content_type};
pub use error::{ViewerError, ViewerResult};
pub use memory::InMemoryStore;
pub use proxy::{FileProxy, ProxiedFile};
pub use render::render_dashboard;
pub use store::{ListPage, ListRequest, ObjectStore, ObjectSummary, StoreError, StoredObject};
