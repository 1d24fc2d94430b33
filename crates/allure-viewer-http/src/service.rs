//! The viewer's hyper `Service`.
//!
//! [`ViewerHttpService`] wraps the [`Router`] for a hyper server. It handles:
//!
//! 1. Health check interception (`GET /_health`)
//! 2. Request id assignment and caller-identity extraction
//! 3. Dispatch through the [`Router`], with panics rendered as 500 pages
//! 4. Common response headers (`x-request-id`, `Server`)

use std::any::Any;
use std::convert::Infallible;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use allure_viewer_core::ViewerConfig;
use allure_viewer_core::format::escape_html;
use bytes::Bytes;
use futures::FutureExt as _;
use http::StatusCode;
use http::header::{CONTENT_TYPE, HeaderValue, SERVER};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::Service;
use tracing::{debug, error};
use uuid::Uuid;

use crate::response::GatewayResponse;
use crate::router::{RequestContext, Router};

/// Path answered by the service itself for load-balancer health checks.
pub const HEALTH_PATH: &str = "/_health";

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const SERVER_NAME: &str = "allure-viewer";

/// Hyper service serving the report viewer.
#[derive(Debug, Clone)]
pub struct ViewerHttpService {
    router: Arc<Router>,
    identity_header: String,
}

impl ViewerHttpService {
    /// Create a service reading the caller identity from `identity_header`.
    #[must_use]
    pub fn new(router: Router, identity_header: impl Into<String>) -> Self {
        Self {
            router: Arc::new(router),
            identity_header: identity_header.into(),
        }
    }

    /// Create a service using the identity header from `config`.
    #[must_use]
    pub fn from_config(router: Router, config: &ViewerConfig) -> Self {
        Self::new(router, config.identity_header.clone())
    }

    /// Process one request. Never fails; the request body is ignored.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>> {
        let request_id = Uuid::new_v4().to_string();
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        debug!(%method, %path, %request_id, "processing viewer request");

        let response = if method == http::Method::GET && path == HEALTH_PATH {
            self.health_response()
        } else {
            let ctx = RequestContext {
                caller_identity: req
                    .headers()
                    .get(self.identity_header.as_str())
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_owned),
                path,
                request_id: request_id.clone(),
            };
            self.dispatch_guarded(&ctx).await.into_http()
        };

        add_common_headers(response, &request_id)
    }

    async fn dispatch_guarded(&self, ctx: &RequestContext) -> GatewayResponse {
        match AssertUnwindSafe(self.router.dispatch(ctx))
            .catch_unwind()
            .await
        {
            Ok(response) => response,
            Err(panic) => {
                let message = panic_message(&*panic);
                error!(request_id = %ctx.request_id, path = %ctx.path, panic = %message, "request handler panicked");
                GatewayResponse::error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &format!(
                        "<p>Internal error while handling the request.</p>\n<pre>{}</pre>",
                        escape_html(&message)
                    ),
                )
            }
        }
    }

    fn health_response(&self) -> http::Response<Full<Bytes>> {
        let catalog = self.router.catalog();
        let doc = serde_json::json!({
            "status": "running",
            "service": SERVER_NAME,
            "bucket": catalog.bucket(),
            "catalog": catalog.metrics().snapshot(),
        });

        let mut response = http::Response::new(Full::new(Bytes::from(doc.to_string())));
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

impl Service<http::Request<Incoming>> for ViewerHttpService {
    type Response = http::Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.handle(req).await) })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Add headers carried by every response.
fn add_common_headers(
    mut response: http::Response<Full<Bytes>>,
    request_id: &str,
) -> http::Response<Full<Bytes>> {
    let headers = response.headers_mut();
    if let Ok(hv) = HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, hv);
    }
    headers.insert(SERVER, HeaderValue::from_static(SERVER_NAME));
    response
}
