//! Analysis flow tests against a mock layout service

use finsight_docintel::{to_markdown, DocIntelClient};
use std::time::Duration;

fn write_fixture(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("TSLA--10-K--2024-10-01_120000.pdf");
    std::fs::write(&path, b"%PDF-1.4 fake").expect("Failed to write fixture");
    path
}

fn fast_client(server: &mockito::Server) -> DocIntelClient {
    DocIntelClient::new(server.url(), "doc-key").with_poll_interval(Duration::from_millis(5))
}

const ANALYZE_PATH: &str =
    "/documentintelligence/documentModels/prebuilt-layout:analyze?api-version=2024-11-30";

#[tokio::test]
async fn test_analyze_polls_until_succeeded() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir);

    let mut server = mockito::Server::new_async().await;
    let operation_url = format!("{}/operations/op_1", server.url());

    let submit = server
        .mock("POST", ANALYZE_PATH)
        .match_header("ocp-apim-subscription-key", "doc-key")
        .with_status(202)
        .with_header("operation-location", &operation_url)
        .create_async()
        .await;

    let running = server
        .mock("GET", "/operations/op_1")
        .with_status(200)
        .with_body(r#"{"status": "running"}"#)
        .expect(1)
        .create_async()
        .await;

    let succeeded = server
        .mock("GET", "/operations/op_1")
        .with_status(200)
        .with_body(
            r#"{
                "status": "succeeded",
                "analyzeResult": {
                    "pages": [{"lines": [{"content": "Item 1. Business"}]}],
                    "tables": []
                }
            }"#,
        )
        .create_async()
        .await;

    let result = fast_client(&server).analyze(&path).await.unwrap();
    assert_eq!(to_markdown(&result), "Item 1. Business\n");

    submit.assert_async().await;
    running.assert_async().await;
    succeeded.assert_async().await;
}

#[tokio::test]
async fn test_analyze_failed_status_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir);

    let mut server = mockito::Server::new_async().await;
    let operation_url = format!("{}/operations/op_2", server.url());

    server
        .mock("POST", ANALYZE_PATH)
        .with_status(202)
        .with_header("operation-location", &operation_url)
        .create_async()
        .await;
    server
        .mock("GET", "/operations/op_2")
        .with_status(200)
        .with_body(r#"{"status": "failed"}"#)
        .create_async()
        .await;

    let err = fast_client(&server).analyze(&path).await.unwrap_err();
    assert!(err.to_string().contains("failed"));
}

#[tokio::test]
async fn test_analyze_missing_operation_location() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir);

    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", ANALYZE_PATH)
        .with_status(202)
        .create_async()
        .await;

    let err = fast_client(&server).analyze(&path).await.unwrap_err();
    assert!(err.to_string().contains("operation-location"));
}

#[tokio::test]
async fn test_analyze_rejected_submission() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir);

    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", ANALYZE_PATH)
        .with_status(401)
        .with_body("bad key")
        .create_async()
        .await;

    let err = fast_client(&server).analyze(&path).await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_analyze_missing_file() {
    let server = mockito::Server::new_async().await;
    let err = fast_client(&server)
        .analyze(std::path::Path::new("/nonexistent/file.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, finsight_docintel::DocIntelError::Io(_)));
}
