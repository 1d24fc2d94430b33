//! Extension-based content typing.
//!
//! [`resolve_content_type`] maps a filename to a MIME type from a fixed
//! table; [`TransportEncoding::for_content_type`] decides whether a payload of
//! that type travels as UTF-8 text or as base64.
//!
//! The text/binary split is a substring heuristic, not a MIME-class table: any
//! type mentioning `text`, `javascript`, `json` or `svg` is text-like. This
//! keeps scripts, JSON data and SVG un-encoded, but it also means e.g.
//! `application/xml` is shipped as base64.

/// Type used for unknown or missing extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_MARKERS: [&str; 4] = ["text", "javascript", "json", "svg"];

/// Resolve the MIME type of a file from its extension.
///
/// The extension is the substring after the final `.` of the last path
/// segment, compared case-insensitively. Never fails.
///
/// ```
/// use allure_viewer_core::content_type::resolve_content_type;
///
/// assert_eq!(resolve_content_type("INDEX.HTML"), "text/html; charset=utf-8");
/// assert_eq!(resolve_content_type("README"), "application/octet-stream");
/// ```
#[must_use]
pub fn resolve_content_type(filename: &str) -> &'static str {
    let name = filename.rsplit('/').next().unwrap_or(filename);
    let Some((_, ext)) = name.rsplit_once('.') else {
        return OCTET_STREAM;
    };

    match ext.to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" | "map" => "application/json; charset=utf-8",
        "txt" | "log" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "xml" => "application/xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "ttf" => "font/ttf",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "eot" => "application/vnd.ms-fontobject",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "zip" => "application/zip",
        _ => OCTET_STREAM,
    }
}

/// How a proxied payload is carried in the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportEncoding {
    /// Raw UTF-8 text.
    Identity,
    /// Base64-encoded binary.
    Base64,
}

impl TransportEncoding {
    /// Pick the encoding for a resolved content type.
    #[must_use]
    pub fn for_content_type(content_type: &str) -> Self {
        if is_text_like(content_type) {
            Self::Identity
        } else {
            Self::Base64
        }
    }

    /// Whether the body is base64-encoded.
    #[must_use]
    pub fn is_base64(self) -> bool {
        matches!(self, Self::Base64)
    }
}

/// Whether a MIME string belongs to the text-like family.
#[must_use]
pub fn is_text_like(content_type: &str) -> bool {
    TEXT_MARKERS.iter().any(|m| content_type.contains(m))
}
