use std::path::Path;
use std::pin::Pin;

use anyhow::Result;
use async_trait::async_trait;
use futures::Stream;

use super::AudioBlob;
use super::ChatMessage;
use super::Document;
use super::UploadReceipt;

/// Raw body chunks of a streaming response, in arrival order.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Opens the streaming chat call. Resolves once response headers have
    /// arrived; the body is consumed through the returned stream.
    ///
    /// `history` is the transcript as it was before `query` was submitted.
    async fn open_chat(&self, query: &str, history: &[ChatMessage]) -> Result<ByteStream>;
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// Upload is accepted before the server finishes processing, so the new
    /// document may not show final `status` or `risk_score` right away.
    async fn upload_document(&self, path: &Path) -> Result<UploadReceipt>;

    async fn delete_document(&self, id: &str) -> Result<()>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: AudioBlob) -> Result<String>;
}

/// Where the bearer token lives between calls.
pub trait CredentialProvider: Send + Sync {
    fn get_token(&self) -> Option<String>;
    fn set_token(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}
