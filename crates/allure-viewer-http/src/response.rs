//! Gateway response envelope.
//!
//! [`GatewayResponse`] is what the router produces: status, headers, the raw
//! body bytes and the transport encoding chosen for proxied files.
//! [`GatewayResponse::into_http`] turns it into an `http::Response` for the
//! hyper server without copying the body.

use std::collections::BTreeMap;

use allure_viewer_core::format::escape_html;
use allure_viewer_core::{ProxiedFile, TransportEncoding};
use bytes::Bytes;
use http::StatusCode;
use http::header::{HeaderName, HeaderValue};
use http_body_util::Full;
use tracing::warn;

/// Content type of every page the gateway renders itself.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// A transport-neutral response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers, keyed by lowercase name.
    pub headers: BTreeMap<String, String>,
    /// Raw body bytes.
    pub body: Bytes,
    /// Whether the body is text or binary. Rendered pages are always text.
    pub transport_encoding: TransportEncoding,
}

impl GatewayResponse {
    /// An HTML page with the given status.
    #[must_use]
    pub fn html(status: StatusCode, body: String) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_owned(), HTML_CONTENT_TYPE.to_owned());
        Self {
            status,
            headers,
            body: Bytes::from(body),
            transport_encoding: TransportEncoding::Identity,
        }
    }

    /// A minimal error page. `detail_html` must already be escaped.
    #[must_use]
    pub fn error_page(status: StatusCode, detail_html: &str) -> Self {
        let title = escape_html(&status.to_string());
        Self::html(
            status,
            format!(
                "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
                 <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n{detail_html}\n\
                 <p><a href=\"/\">Back to all reports</a></p>\n</body>\n</html>\n"
            ),
        )
    }

    /// A proxied report file, cacheable for `cache_max_age_secs`.
    ///
    /// Shares the payload buffer with `file`.
    #[must_use]
    pub fn from_file(file: &ProxiedFile, cache_max_age_secs: u64) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_owned(), file.content_type.to_owned());
        headers.insert(
            "cache-control".to_owned(),
            format!("public, max-age={cache_max_age_secs}"),
        );
        Self {
            status: StatusCode::OK,
            headers,
            body: file.payload.clone(),
            transport_encoding: file.transport_encoding,
        }
    }

    /// Look up a header by name, case-insensitively.
    #[cfg(test)]
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Convert into an `http::Response`.
    ///
    /// Headers whose name or value is not valid HTTP are dropped with a
    /// warning.
    #[must_use]
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        response
    }
}
