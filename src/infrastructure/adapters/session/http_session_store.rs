//! HTTP Session Store - 调用远端会话服务
//!
//! 实现 SessionStorePort trait
//!
//! 远端 API:
//! POST /upload-pdf                    multipart 字段 `file`
//!   -> {"session_id", "text", "speech_rate"?, "pitch"?}
//! GET  /session/{id}
//!   -> {"text", "current_position", "speech_rate"?, "pitch"?}
//! POST /session/{id}/speech-settings  {"speech_rate", "pitch"}
//! POST /session/{id}/position         {"position"}

use async_trait::async_trait;
use reqwest::{multipart, Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::{
    PdfUpload, SessionStoreError, SessionStorePort, UploadedDocument,
};
use crate::domain::{Document, SessionId, SessionSnapshot, SpeechSettings};

/// 上传响应
#[derive(Debug, Deserialize)]
struct UploadResponse {
    session_id: String,
    text: String,
    speech_rate: Option<f32>,
    pitch: Option<f32>,
}

/// 会话响应
#[derive(Debug, Deserialize)]
struct SessionResponse {
    text: String,
    #[serde(default)]
    current_position: usize,
    speech_rate: Option<f32>,
    pitch: Option<f32>,
}

#[derive(Debug, Serialize)]
struct SpeechSettingsRequest {
    speech_rate: f32,
    pitch: f32,
}

#[derive(Debug, Serialize)]
struct PositionRequest {
    position: usize,
}

/// HTTP 会话服务客户端配置
#[derive(Debug, Clone)]
pub struct HttpSessionStoreConfig {
    /// 服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpSessionStoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl HttpSessionStoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 会话服务客户端
pub struct HttpSessionStore {
    client: Client,
    base_url: String,
}

impl HttpSessionStore {
    pub fn new(config: HttpSessionStoreConfig) -> Result<Self, SessionStoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SessionStoreError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn upload_url(&self) -> String {
        format!("{}/upload-pdf", self.base_url)
    }

    fn session_url(&self, session_id: &SessionId) -> String {
        format!("{}/session/{}", self.base_url, session_id)
    }

    /// 检查响应状态，404 视为会话不存在
    async fn check_status(
        response: Response,
        session_id: Option<&SessionId>,
    ) -> Result<Response, SessionStoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = session_id {
                return Err(SessionStoreError::NotFound(id.to_string()));
            }
        }
        let error_text = response.text().await.unwrap_or_default();
        Err(SessionStoreError::ServiceError(format!(
            "HTTP {}: {}",
            status, error_text
        )))
    }

    async fn post_json<T: Serialize + ?Sized>(
        &self,
        url: String,
        session_id: &SessionId,
        body: &T,
    ) -> Result<(), SessionStoreError> {
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_send_error)?;
        Self::check_status(response, Some(session_id)).await?;
        Ok(())
    }
}

fn map_send_error(e: reqwest::Error) -> SessionStoreError {
    if e.is_timeout() {
        SessionStoreError::Timeout
    } else if e.is_connect() {
        SessionStoreError::NetworkError(format!("Cannot connect to session service: {}", e))
    } else {
        SessionStoreError::NetworkError(e.to_string())
    }
}

#[async_trait]
impl SessionStorePort for HttpSessionStore {
    async fn upload_pdf(&self, upload: PdfUpload) -> Result<UploadedDocument, SessionStoreError> {
        let size = upload.bytes.len();
        let part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.content_type)
            .map_err(|e| SessionStoreError::NetworkError(e.to_string()))?;
        let form = multipart::Form::new().part("file", part);

        tracing::debug!(
            url = %self.upload_url(),
            file_name = %upload.file_name,
            size_bytes = size,
            "Uploading PDF"
        );

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(map_send_error)?;
        let response = Self::check_status(response, None).await?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| SessionStoreError::InvalidResponse(e.to_string()))?;
        let session_id = SessionId::new(body.session_id)
            .map_err(|e| SessionStoreError::InvalidResponse(e.to_string()))?;

        Ok(UploadedDocument {
            session_id,
            text: body.text,
            settings: SpeechSettings::from_remote(body.speech_rate, body.pitch),
        })
    }

    async fn fetch(&self, session_id: &SessionId) -> Result<SessionSnapshot, SessionStoreError> {
        let response = self
            .client
            .get(self.session_url(session_id))
            .send()
            .await
            .map_err(map_send_error)?;
        let response = Self::check_status(response, Some(session_id)).await?;

        let body: SessionResponse = response
            .json()
            .await
            .map_err(|e| SessionStoreError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            session_id = %session_id,
            position = body.current_position,
            "Session fetched"
        );

        Ok(SessionSnapshot::new(
            session_id.clone(),
            Document::new(body.text),
            body.current_position,
            SpeechSettings::from_remote(body.speech_rate, body.pitch),
        ))
    }

    async fn update_settings(
        &self,
        session_id: &SessionId,
        settings: SpeechSettings,
    ) -> Result<(), SessionStoreError> {
        let body = SpeechSettingsRequest {
            speech_rate: settings.rate,
            pitch: settings.pitch,
        };
        self.post_json(
            format!("{}/speech-settings", self.session_url(session_id)),
            session_id,
            &body,
        )
        .await
    }

    async fn update_position(
        &self,
        session_id: &SessionId,
        position: usize,
    ) -> Result<(), SessionStoreError> {
        self.post_json(
            format!("{}/position", self.session_url(session_id)),
            session_id,
            &PositionRequest { position },
        )
        .await
    }
}
