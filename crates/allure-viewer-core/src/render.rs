//! Dashboard HTML rendering.
//!
//! [`render_dashboard`] is a pure function of the bucket name and the catalog.
//! Timestamps come from the descriptors, never from the wall clock, so the
//! same inputs always render the same page.

use std::fmt::Write as _;

use crate::catalog::{ENTRY_FILE, ReportDescriptor};
use crate::format::{escape_html, format_bytes, format_timestamp};

/// Placeholder shown in the upload-convention hint.
const REPORT_NAME_PLACEHOLDER: &str = "<report-name>";

const STYLE: &str = "\
body{font-family:Arial,Helvetica,sans-serif;margin:0;padding:24px;background:#f5f6f8;color:#1f2933}\
header{margin-bottom:24px}\
h1{margin:0 0 4px 0;font-size:24px}\
.bucket{color:#52606d;font-size:14px}\
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(260px,1fr));gap:16px}\
.card{display:block;background:#fff;border-radius:8px;padding:16px;box-shadow:0 1px 3px rgba(0,0,0,.12);text-decoration:none;color:inherit}\
.card:hover{box-shadow:0 3px 8px rgba(0,0,0,.18)}\
.card h2{margin:0 0 8px 0;font-size:18px;word-break:break-all}\
.meta{font-size:13px;color:#52606d}\
.empty{background:#fff;border-radius:8px;padding:24px;max-width:640px}\
code{background:#eef1f4;padding:2px 4px;border-radius:4px}";

/// Render the dashboard page for `bucket` listing `reports` in the given order.
#[must_use]
pub fn render_dashboard(bucket: &str, reports: &[ReportDescriptor]) -> String {
    let escaped_bucket = escape_html(bucket);
    let mut html = String::with_capacity(2048 + reports.len() * 512);

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>Allure Reports</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <header>\n<h1>Allure Reports</h1>\n\
         <div class=\"bucket\">Bucket: <code>{escaped_bucket}</code> &middot; {count} report(s)</div>\n\
         </header>\n",
        count = reports.len(),
    );

    if reports.is_empty() {
        let hint = escape_html(&upload_convention(bucket));
        let _ = write!(
            html,
            "<section class=\"empty\">\n<h2>No reports yet</h2>\n\
             <p>Upload a generated Allure report so that its entry file lives at \
             <code>{hint}</code>. Each top-level folder containing an \
             <code>{ENTRY_FILE}</code> appears here as a report.</p>\n</section>\n"
        );
    } else {
        html.push_str("<main class=\"grid\">\n");
        for report in reports {
            write_card(&mut html, report);
        }
        html.push_str("</main>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Expected object layout for an uploaded report, e.g. `bucket/<report-name>/index.html`.
#[must_use]
pub fn upload_convention(bucket: &str) -> String {
    format!("{bucket}/{REPORT_NAME_PLACEHOLDER}/{ENTRY_FILE}")
}

fn write_card(html: &mut String, report: &ReportDescriptor) {
    let _ = write!(
        html,
        "<a class=\"card\" href=\"{href}\">\n<h2>{name}</h2>\n\
         <div class=\"meta\">Updated {updated}</div>\n\
         <div class=\"meta\">Entry file {size}</div>\n</a>\n",
        href = escape_html(&report.entry_path()),
        name = escape_html(&report.display_name),
        updated = format_timestamp(&report.last_modified),
        size = format_bytes(report.entry_object_size),
    );
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn descriptor(key: &str, hour: u32, size: u64) -> ReportDescriptor {
        ReportDescriptor {
            key: key.to_owned(),
            entry_object_size: size,
            last_modified: Utc.with_ymd_and_hms(2024, 6, 1, hour, 30, 0).unwrap(),
            display_name: key.to_owned(),
        }
    }

    #[test]
    fn test_should_render_empty_state_with_upload_hint() {
        let html = render_dashboard("allure-reports", &[]);

        assert!(html.contains("allure-reports"));
        assert!(html.contains("allure-reports/&lt;report-name&gt;/index.html"));
        assert!(!html.contains("class=\"card\""));
    }

    #[test]
    fn test_should_render_one_card_per_report() {
        let reports = [descriptor("run-2", 10, 1536), descriptor("run-1", 9, 0)];

        let html = render_dashboard("allure-reports", &reports);

        assert_eq!(html.matches("class=\"card\"").count(), 2);
        assert!(html.contains("href=\"/report/run-2/index.html\""));
        assert!(html.contains("href=\"/report/run-1/index.html\""));
        assert!(html.contains("2024-06-01 10:30:00 UTC"));
        assert!(html.contains("1.5 KB"));
        assert!(html.contains("0 Bytes"));
        assert!(!html.contains("No reports yet"));

        let first = html.find("run-2").expect("run-2 rendered");
        let second = html.find("run-1").expect("run-1 rendered");
        assert!(first < second, "cards keep catalog order");
    }

    #[test]
    fn test_should_escape_report_names_and_bucket() {
        let reports = [descriptor("<script>alert(1)</script>", 1, 10)];

        let html = render_dashboard("b&b", &reports);

        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("b&amp;b"));
        assert!(html.contains("/report/%3Cscript%3Ealert%281%29%3C/script%3E/index.html"));
    }

    #[test]
    fn test_should_escape_bucket_once_in_empty_state() {
        let html = render_dashboard("b&b", &[]);
        assert!(html.contains("b&amp;b/&lt;report-name&gt;/index.html"));
        assert!(!html.contains("&amp;amp;"));
    }

    #[test]
    fn test_should_be_deterministic() {
        let reports = [descriptor("run-1", 9, 42)];
        assert_eq!(
            render_dashboard("bucket", &reports),
            render_dashboard("bucket", &reports)
        );
    }

    #[test]
    fn test_should_describe_upload_convention() {
        assert_eq!(upload_convention("bkt"), "bkt/<report-name>/index.html");
    }
}
