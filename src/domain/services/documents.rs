#[cfg(test)]
#[path = "documents_test.rs"]
mod tests;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::domain::models::Document;
use crate::domain::models::DocumentStore;
use crate::domain::models::UploadReceipt;

/// Client-side cache of the server's document list. Only ever replaced by a
/// full reload.
pub struct DocumentRegistry {
    store: Arc<dyn DocumentStore>,
    documents: Vec<Document>,
    refresh_delay: Duration,
    loaded: bool,
}

impl DocumentRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, refresh_delay: Duration) -> DocumentRegistry {
        return DocumentRegistry {
            store,
            documents: vec![],
            refresh_delay,
            loaded: false,
        };
    }

    pub fn documents(&self) -> &[Document] {
        return &self.documents;
    }

    /// Whether at least one refresh has succeeded.
    pub fn is_loaded(&self) -> bool {
        return self.loaded;
    }

    /// On failure the previous list stays in place.
    pub async fn refresh(&mut self) -> Result<&[Document]> {
        let documents = self.store.list_documents().await?;
        tracing::debug!(count = documents.len(), "documents refreshed");

        self.documents = documents;
        self.loaded = true;

        return Ok(&self.documents);
    }

    /// Uploads a file, then reloads once the server has had `refresh_delay`
    /// to start processing it. A failed reload after an accepted upload is
    /// logged and the receipt is still returned.
    pub async fn upload(&mut self, path: &Path) -> Result<UploadReceipt> {
        let receipt = self.store.upload_document(path).await?;
        tracing::info!(
            document_id = receipt.document_id.as_str(),
            status = receipt.status.as_str(),
            "document uploaded"
        );

        tokio::time::sleep(self.refresh_delay).await;
        if let Err(err) = self.refresh().await {
            tracing::warn!(error = ?err, "refresh after upload failed");
        }

        return Ok(receipt);
    }

    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.store.delete_document(id).await?;
        tracing::info!(document_id = id, "document deleted");

        if let Err(err) = self.refresh().await {
            tracing::warn!(error = ?err, "refresh after delete failed");
        }

        return Ok(());
    }
}
