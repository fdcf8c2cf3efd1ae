use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mockito::Matcher;
use tempdir::TempDir;
use test_utils::documents_fixture;

use crate::domain::models::CredentialProvider;
use crate::domain::models::DocumentStore;
use crate::domain::models::RiskLevel;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::credentials::MemoryCredentials;

fn client(url: &str) -> Result<ApiClient> {
    let credentials = Arc::new(MemoryCredentials::default());
    credentials.set_token("abc123")?;
    return Ok(ApiClient::new(url, Duration::from_secs(5), credentials));
}

#[tokio::test]
async fn it_lists_documents() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/documents/")
        .match_header("authorization", "Bearer abc123")
        .with_status(200)
        .with_body(documents_fixture())
        .create_async()
        .await;

    let documents = client(&server.url())?.list_documents().await?;

    mock.assert_async().await;
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].filename, "invoice.pdf");
    assert_eq!(documents[0].risk_level(), Some(RiskLevel::High));
    assert_eq!(documents[1].status, "processing");
    assert_eq!(documents[1].risk_level(), None);

    return Ok(());
}

#[tokio::test]
async fn it_fetches_one_document() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/documents/9b1d0f3e-2c4a-4e1b-8f55-7a3e6c2d9b40")
        .with_status(200)
        .with_body(
            r#"{"id": "9b1d0f3e-2c4a-4e1b-8f55-7a3e6c2d9b40", "filename": "notes.pdf", "status": "completed", "risk_score": 35, "created_at": "2024-11-02T10:16:30", "content": "ignored"}"#,
        )
        .create_async()
        .await;

    let document = client(&server.url())?
        .get_document("9b1d0f3e-2c4a-4e1b-8f55-7a3e6c2d9b40")
        .await?;

    mock.assert_async().await;
    assert_eq!(document.risk_level(), Some(RiskLevel::Medium));

    return Ok(());
}

#[tokio::test]
async fn it_uploads_a_file_as_multipart() -> Result<()> {
    let dir = TempDir::new("guardrail-upload")?;
    let path = dir.path().join("contract.pdf");
    std::fs::File::create(&path)?.write_all(b"%PDF-1.7 fake")?;

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/upload/")
        .match_header("authorization", "Bearer abc123")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="file"; filename="contract.pdf""#.to_string()),
            Matcher::Regex("%PDF-1.7 fake".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"message": "Upload started", "document_id": "d-1", "status": "processing"}"#)
        .create_async()
        .await;

    let receipt = client(&server.url())?.upload_document(&path).await?;

    mock.assert_async().await;
    assert_eq!(receipt.document_id, "d-1");
    assert_eq!(receipt.status, "processing");

    return Ok(());
}

#[tokio::test]
async fn it_fails_uploads_of_missing_files() -> Result<()> {
    let server = mockito::Server::new_async().await;
    let res = client(&server.url())?
        .upload_document(std::path::Path::new("/nonexistent/guardrail.pdf"))
        .await;

    assert!(res
        .unwrap_err()
        .to_string()
        .starts_with("Could not read /nonexistent/guardrail.pdf"));

    return Ok(());
}

#[tokio::test]
async fn it_deletes_a_document() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/documents/d-1")
        .with_status(200)
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;

    client(&server.url())?.delete_document("d-1").await?;

    mock.assert_async().await;
    return Ok(());
}

#[tokio::test]
async fn it_reports_delete_failures() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("DELETE", "/documents/missing")
        .with_status(404)
        .with_body(r#"{"detail": "Not Found"}"#)
        .create_async()
        .await;

    let res = client(&server.url())?.delete_document("missing").await;

    mock.assert_async().await;
    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Deleting document failed with status 404: Not Found");

    return Ok(());
}
