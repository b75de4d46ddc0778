//! Session Store Port - 远端会话服务抽象
//!
//! 远端服务负责 PDF 文本提取与会话存储，这里只消费其请求/响应契约

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{SessionId, SessionSnapshot, SpeechSettings};

/// Session Store 错误
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 待上传的 PDF 文件
#[derive(Debug, Clone, PartialEq)]
pub struct PdfUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PdfUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// 根据文件名推断 content type
    pub fn from_file_name(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = if has_pdf_extension(&file_name) {
            "application/pdf"
        } else {
            "application/octet-stream"
        };
        Self::new(file_name, content_type, bytes)
    }

    /// 是否为 PDF（content type 含 pdf，或扩展名为 .pdf）
    pub fn is_pdf(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("pdf") || has_pdf_extension(&self.file_name)
    }
}

fn has_pdf_extension(file_name: &str) -> bool {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// 上传成功后服务端建立的会话
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedDocument {
    pub session_id: SessionId,
    pub text: String,
    pub settings: SpeechSettings,
}

/// Session Store Port
#[async_trait]
pub trait SessionStorePort: Send + Sync {
    /// 上传 PDF，服务端提取文本并创建会话
    async fn upload_pdf(&self, upload: PdfUpload) -> Result<UploadedDocument, SessionStoreError>;

    /// 获取会话
    async fn fetch(&self, session_id: &SessionId) -> Result<SessionSnapshot, SessionStoreError>;

    /// 更新朗读参数
    async fn update_settings(
        &self,
        session_id: &SessionId,
        settings: SpeechSettings,
    ) -> Result<(), SessionStoreError>;

    /// 更新朗读位置
    async fn update_position(
        &self,
        session_id: &SessionId,
        position: usize,
    ) -> Result<(), SessionStoreError>;
}
