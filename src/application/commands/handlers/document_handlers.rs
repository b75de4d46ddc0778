//! Document Command Handlers

use std::sync::Arc;

use crate::application::commands::UploadDocument;
use crate::application::error::ApplicationError;
use crate::application::ports::{SessionStorePort, UploadedDocument};

/// UploadDocument Handler - 校验并上传 PDF
pub struct UploadDocumentHandler {
    store: Arc<dyn SessionStorePort>,
    max_size_bytes: u64,
}

impl UploadDocumentHandler {
    pub fn new(store: Arc<dyn SessionStorePort>, max_size_bytes: u64) -> Self {
        Self {
            store,
            max_size_bytes,
        }
    }

    pub async fn handle(&self, command: UploadDocument) -> Result<UploadedDocument, ApplicationError> {
        let file = command.file;

        if !file.is_pdf() {
            return Err(ApplicationError::validation("Please upload a PDF file"));
        }
        if file.bytes.is_empty() {
            return Err(ApplicationError::validation(format!(
                "File is empty: {}",
                file.file_name
            )));
        }
        if file.bytes.len() as u64 > self.max_size_bytes {
            return Err(ApplicationError::validation(format!(
                "File too large: {} bytes (max {})",
                file.bytes.len(),
                self.max_size_bytes
            )));
        }

        let file_name = file.file_name.clone();
        let size = file.bytes.len();
        let uploaded = self.store.upload_pdf(file).await?;

        tracing::info!(
            session_id = %uploaded.session_id,
            file_name = %file_name,
            size_bytes = size,
            text_len = uploaded.text.chars().count(),
            "PDF uploaded"
        );

        Ok(uploaded)
    }
}
