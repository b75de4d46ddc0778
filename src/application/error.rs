//! 应用层错误定义
//!
//! 统一的命令错误类型

use thiserror::Error;

use crate::application::ports::{NarrationError, SessionStoreError};
use crate::domain::PlaybackError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 验证错误（如上传了非 PDF 文件）
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 播放状态机拒绝的操作
    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// 朗读引擎错误
    #[error("Narration error: {0}")]
    Narration(#[from] NarrationError),

    /// 外部服务错误
    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

impl From<SessionStoreError> for ApplicationError {
    fn from(err: SessionStoreError) -> Self {
        Self::ExternalServiceError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err: ApplicationError = PlaybackError::NoDocument.into();
        assert!(matches!(err, ApplicationError::Playback(_)));

        let err: ApplicationError = SessionStoreError::Timeout.into();
        assert_eq!(err.to_string(), "External service error: Request timeout");

        let err: ApplicationError = NarrationError::Synthesis("no audio".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Narration error: Speech synthesis error: no audio"
        );
    }
}
