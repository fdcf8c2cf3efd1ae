#[cfg(test)]
#[path = "transcribe_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart;
use serde_derive::Deserialize;

use super::check_status;
use super::ApiClient;
use crate::domain::models::AudioBlob;
use crate::domain::models::Transcriber;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl Transcriber for ApiClient {
    // Transcription does not require an account, but the token is sent when
    // there is one.
    #[allow(clippy::implicit_return)]
    async fn transcribe(&self, audio: AudioBlob) -> Result<String> {
        let part = multipart::Part::bytes(audio.data)
            .file_name(audio.file_name)
            .mime_str(&audio.mime_type)?;
        let form = multipart::Form::new().part("file", part);

        let mut req = self.with_timeout(self.client.post(self.endpoint("/transcribe/")));
        if let Some(token) = self.credentials.get_token() {
            req = req.bearer_auth(token);
        }

        let res = req.multipart(form).send().await?;
        let res = check_status(res, "Transcription").await?;
        let body = res.json::<TranscriptionResponse>().await?;

        return Ok(body.text.trim().to_string());
    }
}
