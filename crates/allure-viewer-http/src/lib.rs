//! HTTP layer for the Allure report viewer.
//!
//! - **Router** ([`router`]): classifies request paths, calls the catalog or
//!   the file proxy, and maps every failure to an HTML response.
//! - **Responses** ([`response`]): the [`GatewayResponse`] envelope and its
//!   conversion to an `http::Response`.
//! - **Service** ([`service`]): [`ViewerHttpService`], the hyper `Service`
//!   adding health checks, request ids and panic capture around the router.
//!
//! # Architecture
//!
//! ```text
//! HTTP Request
//!   -> ViewerHttpService (hyper Service)
//!     -> GET /_health interception
//!     -> RequestContext (path, caller identity, request id)
//!     -> Router::dispatch (catch_unwind)
//!       -> "/" | callback   -> ReportCatalog::list -> render_dashboard
//!       -> "/report/{key}"  -> FileProxy::fetch
//!       -> anything else    -> 404
//!     -> GatewayResponse::into_http (raw bytes, no copy)
//!     -> Common response headers (x-request-id, Server)
//!   <- HTTP Response
//! ```

pub mod response;
pub mod router;
pub mod service;

pub use response::GatewayResponse;
pub use router::{RequestContext, Route, Router, classify};
pub use service::ViewerHttpService;
