#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use futures::TryStreamExt;
use serde_derive::Serialize;

use super::check_status;
use super::ApiClient;
use crate::domain::models::ByteStream;
use crate::domain::models::ChatBackend;
use crate::domain::models::ChatMessage;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
    history: &'a [ChatMessage],
}

#[async_trait]
impl ChatBackend for ApiClient {
    // The answer streams for as long as the model generates, so only the
    // wait for response headers is bounded by the request timeout.
    #[allow(clippy::implicit_return)]
    async fn open_chat(&self, query: &str, history: &[ChatMessage]) -> Result<ByteStream> {
        let req = self
            .authorized(self.client.post(self.endpoint("/chat/")))?
            .json(&ChatRequest { query, history });

        let res = tokio::time::timeout(self.timeout, req.send())
            .await
            .map_err(|_| return anyhow::anyhow!("Chat request timed out"))??;
        let res = check_status(res, "Chat").await?;

        tracing::debug!(history = history.len(), "chat stream opened");
        let body = res
            .bytes_stream()
            .map_ok(|chunk| return chunk.to_vec())
            .map_err(anyhow::Error::from);

        return Ok(body.boxed());
    }
}
