#[cfg(test)]
#[path = "documents_test.rs"]
mod tests;

use std::path::Path;

use anyhow::Context;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart;

use super::check_status;
use super::ApiClient;
use crate::domain::models::Document;
use crate::domain::models::DocumentStore;
use crate::domain::models::UploadReceipt;

impl ApiClient {
    pub async fn get_document(&self, id: &str) -> Result<Document> {
        let res = self
            .authorized(
                self.with_timeout(self.client.get(self.endpoint(&format!("/documents/{id}")))),
            )?
            .send()
            .await?;

        let res = check_status(res, "Fetching document").await?;
        return Ok(res.json::<Document>().await?);
    }
}

#[async_trait]
impl DocumentStore for ApiClient {
    #[allow(clippy::implicit_return)]
    async fn list_documents(&self) -> Result<Vec<Document>> {
        let res = self
            .authorized(self.with_timeout(self.client.get(self.endpoint("/documents/"))))?
            .send()
            .await?;

        let res = check_status(res, "Listing documents").await?;
        return Ok(res.json::<Vec<Document>>().await?);
    }

    #[allow(clippy::implicit_return)]
    async fn upload_document(&self, path: &Path) -> Result<UploadReceipt> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| return format!("Could not read {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| return name.to_string_lossy().to_string())
            .unwrap_or_else(|| return "document".to_string());

        tracing::debug!(
            file_name = file_name.as_str(),
            bytes = data.len(),
            "uploading document"
        );
        let part = multipart::Part::bytes(data).file_name(file_name);
        let form = multipart::Form::new().part("file", part);

        let res = self
            .authorized(self.with_timeout(self.client.post(self.endpoint("/upload/"))))?
            .multipart(form)
            .send()
            .await?;

        let res = check_status(res, "Upload").await?;
        return Ok(res.json::<UploadReceipt>().await?);
    }

    #[allow(clippy::implicit_return)]
    async fn delete_document(&self, id: &str) -> Result<()> {
        let res = self
            .authorized(
                self.with_timeout(
                    self.client
                        .delete(self.endpoint(&format!("/documents/{id}"))),
                ),
            )?
            .send()
            .await?;

        check_status(res, "Deleting document").await?;
        return Ok(());
    }
}
