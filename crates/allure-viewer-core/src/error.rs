//! Viewer error taxonomy.
//!
//! Pure components never fail. The catalog and the file proxy return
//! [`ViewerError`]; the router is the only place that turns these into HTTP
//! status codes and bodies.

use http::StatusCode;

use crate::store::StoreError;

/// Errors surfaced by the viewer's I/O components.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// The requested object does not exist in the bucket.
    #[error("not found: {key}")]
    NotFound {
        /// Object key that was requested.
        key: String,
    },

    /// The request path does not name an object (e.g. `/report/`).
    #[error("invalid report path: {path}")]
    InvalidKey {
        /// Request path as received.
        path: String,
    },

    /// The object store failed for a reason other than "no such key".
    #[error("upstream object store error: {source}")]
    Upstream {
        /// Underlying store failure.
        #[from]
        source: StoreError,
    },

    /// Listing the bucket failed entirely. The dashboard degrades to its
    /// empty state when this happens.
    #[error("report catalog unavailable: {reason}")]
    CatalogUnavailable {
        /// Description of the listing failure.
        reason: String,
    },

    /// The path matches none of the recognized routes.
    #[error("no route for {path}")]
    BadRoute {
        /// Request path as received.
        path: String,
    },
}

impl ViewerError {
    /// HTTP status code this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } | Self::InvalidKey { .. } | Self::BadRoute { .. } => {
                StatusCode::NOT_FOUND
            }
            Self::Upstream { .. } | Self::CatalogUnavailable { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Convenience result type for viewer operations.
pub type ViewerResult<T> = Result<T, ViewerError>;
