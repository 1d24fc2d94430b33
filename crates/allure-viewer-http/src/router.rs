//! Request routing and error mapping.
//!
//! The router is a stateless per-request dispatcher:
//!
//! | Path | Action |
//! |------|--------|
//! | `/` or the identity-provider callback path | dashboard |
//! | `/report/{key}/{...}` | proxy object `{key}/{...}` |
//! | anything else | 404 |
//!
//! [`Router::dispatch`] never fails. Every [`ViewerError`] is rendered into a
//! response here and nowhere else.
//!
//! File requests run under the request budget; one that overruns it is
//! answered with a 500 page. The dashboard is bounded by the catalog's own
//! listing budget and degrades to its empty state instead.

use std::sync::Arc;
use std::time::Duration;

use allure_viewer_core::format::escape_html;
use allure_viewer_core::{
    FileProxy, ObjectStore, ReportCatalog, StoreError, ViewerConfig, ViewerError, ViewerResult,
    render_dashboard,
};
use http::StatusCode;
use percent_encoding::percent_decode_str;
use tracing::{debug, info, warn};

use crate::response::GatewayResponse;

/// Routing prefix for proxied report files.
pub const REPORT_PREFIX: &str = "/report/";

/// Per-request input to the router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Request path without the query string, as received.
    pub path: String,
    /// Caller identity claim injected by the authenticating proxy. Logged only.
    pub caller_identity: Option<String>,
    /// Correlation id for logs.
    pub request_id: String,
}

impl RequestContext {
    /// Context for `path` with no identity.
    #[must_use]
    pub fn for_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// What a request path resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The report dashboard.
    Dashboard,
    /// A file inside a report bundle.
    ReportFile {
        /// Object key, percent-decoded.
        key: String,
    },
}

/// Classify a request path.
///
/// The path is percent-decoded first so `/report/nightly%20build/index.html`
/// addresses the key `nightly build/index.html`.
pub fn classify(path: &str, callback_path: &str) -> ViewerResult<Route> {
    let decoded = percent_decode_str(path).decode_utf8_lossy();

    if decoded == "/" || decoded == callback_path {
        return Ok(Route::Dashboard);
    }

    match decoded.strip_prefix(REPORT_PREFIX) {
        Some("") => Err(ViewerError::InvalidKey {
            path: decoded.to_string(),
        }),
        Some(key) => Ok(Route::ReportFile {
            key: key.to_owned(),
        }),
        None => Err(ViewerError::BadRoute {
            path: decoded.to_string(),
        }),
    }
}

/// Dispatches requests to the dashboard or the file proxy.
#[derive(Debug, Clone)]
pub struct Router {
    catalog: ReportCatalog,
    proxy: FileProxy,
    callback_path: String,
    cache_max_age_secs: u64,
    request_timeout: Duration,
}

impl Router {
    /// Create a router from its components.
    #[must_use]
    pub fn new(
        catalog: ReportCatalog,
        proxy: FileProxy,
        callback_path: impl Into<String>,
        cache_max_age_secs: u64,
        request_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            proxy,
            callback_path: callback_path.into(),
            cache_max_age_secs,
            request_timeout,
        }
    }

    /// Wire a catalog and a proxy over the same `store`.
    #[must_use]
    pub fn from_config(store: Arc<dyn ObjectStore>, config: &ViewerConfig) -> Self {
        Self::new(
            ReportCatalog::from_config(Arc::clone(&store), config),
            FileProxy::from_config(store, config),
            config.callback_path.clone(),
            config.cache_max_age_secs,
            config.request_timeout(),
        )
    }

    /// The catalog behind the dashboard.
    #[must_use]
    pub fn catalog(&self) -> &ReportCatalog {
        &self.catalog
    }

    /// Handle one request.
    pub async fn dispatch(&self, ctx: &RequestContext) -> GatewayResponse {
        info!(
            path = %ctx.path,
            caller = ctx.caller_identity.as_deref().unwrap_or("-"),
            request_id = %ctx.request_id,
            "viewer request"
        );

        match self.route(ctx).await {
            Ok(response) => response,
            Err(err) => {
                if err.status_code().is_server_error() {
                    warn!(error = %err, request_id = %ctx.request_id, "request failed");
                } else {
                    debug!(error = %err, request_id = %ctx.request_id, "request not found");
                }
                error_response(&err)
            }
        }
    }

    async fn route(&self, ctx: &RequestContext) -> ViewerResult<GatewayResponse> {
        match classify(&ctx.path, &self.callback_path)? {
            Route::Dashboard => Ok(self.dashboard(ctx).await),
            Route::ReportFile { key } => {
                let file = tokio::time::timeout(self.request_timeout, self.proxy.fetch(&key))
                    .await
                    .map_err(|_| ViewerError::Upstream {
                        source: StoreError::Timeout {
                            operation: "GetObject",
                            after: self.request_timeout,
                        },
                    })??;
                debug!(
                    key = %file.key,
                    encoding = ?file.transport_encoding,
                    request_id = %ctx.request_id,
                    "serving report file"
                );
                Ok(GatewayResponse::from_file(&file, self.cache_max_age_secs))
            }
        }
    }

    async fn dashboard(&self, ctx: &RequestContext) -> GatewayResponse {
        let listing = self.catalog.list().await;
        if let Some(err) = listing.failure() {
            warn!(error = %err, request_id = %ctx.request_id, "rendering empty dashboard");
        }
        GatewayResponse::html(
            StatusCode::OK,
            render_dashboard(self.catalog.bucket(), &listing.reports),
        )
    }
}

/// Render an error as an HTML response.
#[must_use]
pub fn error_response(err: &ViewerError) -> GatewayResponse {
    let detail = match err {
        ViewerError::NotFound { key } => format!(
            "<p>No file at <code>{}</code>.</p>",
            escape_html(&format!("{REPORT_PREFIX}{key}"))
        ),
        ViewerError::InvalidKey { path } => format!(
            "<p><code>{}</code> does not name a report file.</p>",
            escape_html(path)
        ),
        ViewerError::BadRoute { .. } => "<p>The page you requested does not exist.</p>".to_owned(),
        ViewerError::Upstream { .. } | ViewerError::CatalogUnavailable { .. } => format!(
            "<p>The report store could not be read.</p>\n<pre>{}</pre>",
            escape_html(&err.to_string())
        ),
    };
    GatewayResponse::error_page(err.status_code(), &detail)
}
