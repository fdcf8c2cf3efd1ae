#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;

use anyhow::Result;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::check_status;
use super::ApiClient;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct GoogleAuthRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password_hash: &'a str,
    role: &'a str,
}

impl ApiClient {
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let res = self
            .with_timeout(self.client.post(self.endpoint("/token")))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        return self.store_token(check_status(res, "Login").await?).await;
    }

    /// Exchanges an identity-provider credential for a GuardRail token.
    pub async fn google_login(&self, credential: &str) -> Result<()> {
        let res = self
            .with_timeout(self.client.post(self.endpoint("/auth/google")))
            .json(&GoogleAuthRequest { token: credential })
            .send()
            .await?;

        return self
            .store_token(check_status(res, "Google login").await?)
            .await;
    }

    /// The server hashes `password` before storing it.
    pub async fn register(&self, email: &str, password: &str) -> Result<()> {
        let res = self
            .with_timeout(self.client.post(self.endpoint("/users/")))
            .json(&RegisterRequest {
                email,
                password_hash: password,
                role: "user",
            })
            .send()
            .await?;

        check_status(res, "Registration").await?;
        tracing::info!(email = email, "account registered");

        return Ok(());
    }

    pub fn logout(&self) -> Result<()> {
        return self.credentials.clear();
    }

    async fn store_token(&self, res: reqwest::Response) -> Result<()> {
        let body = res.json::<TokenResponse>().await?;
        self.credentials.set_token(&body.access_token)?;
        tracing::debug!("access token stored");

        return Ok(());
    }
}
