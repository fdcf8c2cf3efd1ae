#[cfg(test)]
#[path = "api_test.rs"]
mod tests;

mod auth;
mod chat;
mod documents;
mod transcribe;

use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;
use serde_derive::Deserialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::CredentialProvider;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// HTTP client for the GuardRail server. Implements every backend trait the
/// domain services depend on.
pub struct ApiClient {
    url: String,
    timeout: Duration,
    credentials: Arc<dyn CredentialProvider>,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(url: &str, timeout: Duration, credentials: Arc<dyn CredentialProvider>) -> ApiClient {
        return ApiClient {
            url: url.trim_end_matches('/').to_string(),
            timeout,
            credentials,
            client: reqwest::Client::new(),
        };
    }

    pub fn from_config(credentials: Arc<dyn CredentialProvider>) -> Result<ApiClient> {
        return Ok(ApiClient::new(
            &Config::get(ConfigKey::ApiURL),
            Config::get_duration(ConfigKey::RequestTimeout)?,
            credentials,
        ));
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialProvider> {
        return &self.credentials;
    }

    fn endpoint(&self, path: &str) -> String {
        return format!("{url}{path}", url = self.url);
    }

    /// Attaches the bearer token, failing before any request is sent when
    /// there is none.
    fn authorized(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        match self.credentials.get_token() {
            Some(token) => return Ok(req.bearer_auth(token)),
            None => bail!("Not authenticated"),
        }
    }

    fn with_timeout(&self, req: RequestBuilder) -> RequestBuilder {
        return req.timeout(self.timeout);
    }
}

/// Turns non-2xx responses into errors. A 401 always reads as
/// "Not authenticated"; other failures carry the server's `detail` when present.
async fn check_status(res: Response, action: &str) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    tracing::error!(status = status.as_u16(), action = action, "request failed");
    if status == StatusCode::UNAUTHORIZED {
        bail!("Not authenticated");
    }

    let body = res.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => body.trim().to_string(),
    };

    if detail.is_empty() {
        bail!(format!("{action} failed with status {}", status.as_u16()));
    }

    bail!(format!(
        "{action} failed with status {}: {detail}",
        status.as_u16()
    ));
}
