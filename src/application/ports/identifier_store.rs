//! Identifier Store Port - 本地会话标识持久化
//!
//! 单个字符串键保存当前会话标识，启动时读取一次

use thiserror::Error;

use crate::domain::SessionId;

/// 本地存储中保存会话标识的键
pub const ACTIVE_SESSION_KEY: &str = "active_session";

#[derive(Debug, Error)]
pub enum IdentifierStoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Identifier Store Port
pub trait IdentifierStorePort: Send + Sync {
    /// 保存会话标识
    fn persist(&self, session_id: &SessionId) -> Result<(), IdentifierStoreError>;

    /// 读取会话标识
    fn load(&self) -> Result<Option<SessionId>, IdentifierStoreError>;

    /// 清除会话标识
    fn clear(&self) -> Result<(), IdentifierStoreError>;
}
