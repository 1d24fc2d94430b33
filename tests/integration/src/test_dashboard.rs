//! Dashboard and routing integration tests.

#[cfg(test)]
mod tests {
    use crate::{
        cleanup_prefix, ensure_bucket, put_object, report_bucket, s3_client, test_report_name,
        viewer_url,
    };

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_uploaded_report_on_dashboard() {
        let client = s3_client();
        let bucket = report_bucket();
        ensure_bucket(&client, &bucket).await;
        let report = test_report_name("dash");
        put_object(
            &client,
            &bucket,
            &format!("{report}/index.html"),
            b"<html>allure</html>".to_vec(),
        )
        .await;

        let resp = reqwest::get(format!("{}/", viewer_url()))
            .await
            .expect("GET /");

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert_eq!(
            resp.headers()["content-type"],
            "text/html; charset=utf-8"
        );
        let html = resp.text().await.expect("body");
        assert!(html.contains(&bucket));
        assert!(html.contains(&format!("/report/{report}/index.html")));

        cleanup_prefix(&client, &bucket, &format!("{report}/")).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_hide_folder_without_entry_file() {
        let client = s3_client();
        let bucket = report_bucket();
        ensure_bucket(&client, &bucket).await;
        let report = test_report_name("partial");
        put_object(
            &client,
            &bucket,
            &format!("{report}/data/suites.json"),
            b"{}".to_vec(),
        )
        .await;

        let html = reqwest::get(format!("{}/", viewer_url()))
            .await
            .expect("GET /")
            .text()
            .await
            .expect("body");

        assert!(!html.contains(&report));

        cleanup_prefix(&client, &bucket, &format!("{report}/")).await;
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_serve_dashboard_on_callback_path() {
        let resp = reqwest::get(format!("{}/oauth2/idpresponse", viewer_url()))
            .await
            .expect("GET callback");

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert!(resp.text().await.expect("body").contains("Allure Reports"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_return_404_for_unknown_path() {
        let resp = reqwest::get(format!("{}/favicon.ico", viewer_url()))
            .await
            .expect("GET unknown");

        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
        assert!(resp.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_health_with_catalog_metrics() {
        let resp = reqwest::get(format!("{}/_health", viewer_url()))
            .await
            .expect("GET health");

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let json: serde_json::Value =
            serde_json::from_str(&resp.text().await.expect("body")).expect("json");
        assert_eq!(json["status"], "running");
        assert!(json["catalog"]["listings"].is_u64());
    }
}
