//! File proxy integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use crate::{
        cleanup_prefix, ensure_bucket, put_object, report_bucket, s3_client, test_report_name,
        viewer_url,
    };

    const PNG: &[u8] = &[
        0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, b'I', b'H', b'D',
        b'R', 0xff, 0xfe,
    ];

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_proxy_html_unchanged() {
        let client = s3_client();
        let bucket = report_bucket();
        ensure_bucket(&client, &bucket).await;
        let report = test_report_name("html");
        let html = b"<!DOCTYPE html><html><body>suite passed</body></html>";
        put_object(&client, &bucket, &format!("{report}/index.html"), html.to_vec()).await;

        let resp = reqwest::get(format!("{}/report/{report}/index.html", viewer_url()))
            .await
            .expect("GET report");

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(
            resp.headers()["content-type"],
            "text/html; charset=utf-8"
        );
        assert!(resp.headers().contains_key("cache-control"));
        assert_eq!(resp.bytes().await.expect("body"), Bytes::from_static(html));

        cleanup_prefix(&client, &bucket, &format!("{report}/")).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_proxy_binary_bytes_exactly() {
        let client = s3_client();
        let bucket = report_bucket();
        ensure_bucket(&client, &bucket).await;
        let report = test_report_name("png");
        put_object(&client, &bucket, &format!("{report}/img/logo.png"), PNG.to_vec()).await;

        let resp = reqwest::get(format!("{}/report/{report}/img/logo.png", viewer_url()))
            .await
            .expect("GET png");

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "image/png");
        assert_eq!(resp.bytes().await.expect("body"), Bytes::from_static(PNG));

        cleanup_prefix(&client, &bucket, &format!("{report}/")).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_404_naming_missing_file() {
        let client = s3_client();
        ensure_bucket(&client, &report_bucket()).await;
        let report = test_report_name("missing");

        let resp = reqwest::get(format!("{}/report/{report}/missing.txt", viewer_url()))
            .await
            .expect("GET missing");

        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        let body = resp.text().await.expect("body");
        assert!(body.contains(&format!("/report/{report}/missing.txt")));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_decode_percent_encoded_keys() {
        let client = s3_client();
        let bucket = report_bucket();
        ensure_bucket(&client, &bucket).await;
        let report = test_report_name("spaced");
        let key = format!("{report}/nightly build.txt");
        put_object(&client, &bucket, &key, b"log line".to_vec()).await;

        let resp = reqwest::get(format!("{}/report/{report}/nightly%20build.txt", viewer_url()))
            .await
            .expect("GET spaced");

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(resp.text().await.expect("body"), "log line");

        cleanup_prefix(&client, &bucket, &format!("{report}/")).await;
    }
}
