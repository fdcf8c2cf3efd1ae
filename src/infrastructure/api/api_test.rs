use std::sync::Arc;
use std::time::Duration;

use super::check_status;
use super::ApiClient;
use crate::infrastructure::credentials::MemoryCredentials;

#[test]
fn it_trims_trailing_slashes_from_the_base_url() {
    let client = ApiClient::new(
        "http://localhost:8000/",
        Duration::from_secs(1),
        Arc::new(MemoryCredentials::default()),
    );

    assert_eq!(client.endpoint("/chat/"), "http://localhost:8000/chat/");
}

#[tokio::test]
async fn it_formats_structured_details() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/documents/")
        .with_status(422)
        .with_body(r#"{"detail": [{"msg": "field required"}]}"#)
        .create_async()
        .await;

    let res = reqwest::get(format!("{}/documents/", server.url()))
        .await
        .unwrap();
    let err = check_status(res, "Listing documents").await.unwrap_err();

    insta::assert_snapshot!(err.to_string(), @r###"Listing documents failed with status 422: [{"msg":"field required"}]"###);
}

#[tokio::test]
async fn it_omits_empty_bodies() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/documents/")
        .with_status(503)
        .create_async()
        .await;

    let res = reqwest::get(format!("{}/documents/", server.url()))
        .await
        .unwrap();
    let err = check_status(res, "Listing documents").await.unwrap_err();

    assert_eq!(err.to_string(), "Listing documents failed with status 503");
}
