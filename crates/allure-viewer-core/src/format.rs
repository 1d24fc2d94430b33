//! Formatting helpers for the dashboard and error pages.

use chrono::{DateTime, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Characters left as-is when a key is placed into a URL path.
const PATH_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Format a byte count as `"<value> <unit>"` using powers of 1024.
///
/// The value is rounded to two decimals with trailing zeros dropped; counts
/// beyond the gigabyte range stay in GB.
///
/// ```
/// use allure_viewer_core::format::format_bytes;
///
/// assert_eq!(format_bytes(0), "0 Bytes");
/// assert_eq!(format_bytes(1536), "1.5 KB");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    let mut unit = 0;
    let mut scale: u64 = 1;
    while unit < SIZE_UNITS.len() - 1 && bytes / scale >= 1024 {
        scale *= 1024;
        unit += 1;
    }

    let value = (bytes as f64 / scale as f64 * 100.0).round() / 100.0;
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", SIZE_UNITS[unit])
}

/// Escape text for inclusion in HTML element content or attribute values.
///
/// ```
/// use allure_viewer_core::format::escape_html;
///
/// assert_eq!(escape_html("a<b>c"), "a&lt;b&gt;c");
/// assert_eq!(escape_html("x&y"), "x&amp;y");
/// ```
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Percent-encode an object key for use in a URL path, keeping `/` intact.
#[must_use]
pub fn encode_key_path(key: &str) -> String {
    utf8_percent_encode(key, PATH_SAFE).to_string()
}

/// Render a timestamp the way the dashboard shows it.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
