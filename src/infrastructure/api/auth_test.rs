use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use mockito::Matcher;

use crate::domain::models::CredentialProvider;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::credentials::MemoryCredentials;

fn client(url: &str) -> (ApiClient, Arc<MemoryCredentials>) {
    let credentials = Arc::new(MemoryCredentials::default());
    let client = ApiClient::new(url, Duration::from_secs(5), credentials.clone());
    return (client, credentials);
}

#[tokio::test]
async fn it_logs_in_with_a_form() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/token")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("username".to_string(), "ada@example.com".to_string()),
            Matcher::UrlEncoded("password".to_string(), "hunter2".to_string()),
        ]))
        .with_status(200)
        .with_body(r#"{"access_token": "abc123", "token_type": "bearer"}"#)
        .create_async()
        .await;

    let (client, credentials) = client(&server.url());
    client.login("ada@example.com", "hunter2").await?;

    mock.assert_async().await;
    assert_eq!(credentials.get_token(), Some("abc123".to_string()));

    return Ok(());
}

#[tokio::test]
async fn it_reports_bad_credentials() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/token")
        .with_status(401)
        .with_body(r#"{"detail": "Incorrect email or password"}"#)
        .create_async()
        .await;

    let (client, credentials) = client(&server.url());
    let res = client.login("ada@example.com", "wrong").await;

    mock.assert_async().await;
    assert_eq!(res.unwrap_err().to_string(), "Not authenticated");
    assert_eq!(credentials.get_token(), None);
}

#[tokio::test]
async fn it_logs_in_with_google() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/auth/google")
        .match_body(Matcher::Json(serde_json::json!({"token": "google-credential"})))
        .with_status(200)
        .with_body(r#"{"access_token": "from-google", "token_type": "bearer"}"#)
        .create_async()
        .await;

    let (client, credentials) = client(&server.url());
    client.google_login("google-credential").await?;

    mock.assert_async().await;
    assert_eq!(credentials.get_token(), Some("from-google".to_string()));

    return Ok(());
}

#[tokio::test]
async fn it_surfaces_the_server_detail() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/auth/google")
        .with_status(400)
        .with_body(r#"{"detail": "Invalid Google Token"}"#)
        .create_async()
        .await;

    let (client, _) = client(&server.url());
    let res = client.google_login("expired").await;

    mock.assert_async().await;
    insta::assert_snapshot!(res.unwrap_err().to_string(), @"Google login failed with status 400: Invalid Google Token");
}

#[tokio::test]
async fn it_registers_a_user_account() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/users/")
        .match_body(Matcher::Json(serde_json::json!({
            "email": "ada@example.com",
            "password_hash": "hunter2",
            "role": "user"
        })))
        .with_status(200)
        .with_body(r#"{"id": "1", "email": "ada@example.com", "role": "user"}"#)
        .create_async()
        .await;

    let (client, credentials) = client(&server.url());
    client.register("ada@example.com", "hunter2").await?;

    mock.assert_async().await;
    assert_eq!(credentials.get_token(), None);

    return Ok(());
}

#[tokio::test]
async fn it_clears_the_token_on_logout() -> Result<()> {
    let (client, credentials) = client("http://localhost:1");
    credentials.set_token("abc123")?;

    client.logout()?;

    assert_eq!(credentials.get_token(), None);
    return Ok(());
}
