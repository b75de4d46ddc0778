//! Sled-based Identifier Store Implementation
//!
//! 跨重启保存当前会话标识（键 `active_session`）

use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::sync::Arc;

use crate::application::ports::{IdentifierStoreError, IdentifierStorePort, ACTIVE_SESSION_KEY};
use crate::domain::SessionId;

/// Sled 存储配置
#[derive(Debug, Clone)]
pub struct SledStoreConfig {
    /// 数据库路径
    pub db_path: String,
}

impl Default for SledStoreConfig {
    fn default() -> Self {
        Self {
            db_path: "data/state.sled".to_string(),
        }
    }
}

/// 存储记录
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredIdentifier {
    session_id: String,
}

/// Sled 标识存储
pub struct SledIdentifierStore {
    db: Db,
}

impl SledIdentifierStore {
    pub fn new(config: &SledStoreConfig) -> Result<Self, IdentifierStoreError> {
        let db = sled::open(&config.db_path)
            .map_err(|e| IdentifierStoreError::DatabaseError(e.to_string()))?;

        tracing::info!(
            db_path = %config.db_path,
            has_active_session = db.contains_key(ACTIVE_SESSION_KEY).unwrap_or(false),
            "SledIdentifierStore initialized"
        );

        Ok(Self { db })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, IdentifierStoreError> {
        let config = SledStoreConfig {
            db_path: path.as_ref().to_string_lossy().to_string(),
        };
        Self::new(&config)
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn flush(&self) -> Result<(), IdentifierStoreError> {
        self.db
            .flush()
            .map_err(|e| IdentifierStoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

impl IdentifierStorePort for SledIdentifierStore {
    fn persist(&self, session_id: &SessionId) -> Result<(), IdentifierStoreError> {
        let record = StoredIdentifier {
            session_id: session_id.as_str().to_string(),
        };
        let value = serde_json::to_vec(&record)
            .map_err(|e| IdentifierStoreError::SerializationError(e.to_string()))?;

        self.db
            .insert(ACTIVE_SESSION_KEY, value)
            .map_err(|e| IdentifierStoreError::DatabaseError(e.to_string()))?;
        self.flush()?;

        tracing::debug!(session_id = %session_id, "Active session persisted");
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionId>, IdentifierStoreError> {
        let Some(value) = self
            .db
            .get(ACTIVE_SESSION_KEY)
            .map_err(|e| IdentifierStoreError::DatabaseError(e.to_string()))?
        else {
            return Ok(None);
        };

        let record: StoredIdentifier = serde_json::from_slice(&value)
            .map_err(|e| IdentifierStoreError::SerializationError(e.to_string()))?;
        SessionId::new(record.session_id)
            .map(Some)
            .map_err(|e| IdentifierStoreError::SerializationError(e.to_string()))
    }

    fn clear(&self) -> Result<(), IdentifierStoreError> {
        self.db
            .remove(ACTIVE_SESSION_KEY)
            .map_err(|e| IdentifierStoreError::DatabaseError(e.to_string()))?;
        self.flush()?;

        tracing::debug!("Active session cleared");
        Ok(())
    }
}
