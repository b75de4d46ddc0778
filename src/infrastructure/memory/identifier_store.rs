//! In-Memory Identifier Store Implementation

use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::{IdentifierStoreError, IdentifierStorePort, ACTIVE_SESSION_KEY};
use crate::domain::SessionId;

/// 内存键值存储（无持久化）
pub struct InMemoryIdentifierStore {
    entries: DashMap<String, String>,
}

impl InMemoryIdentifierStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryIdentifierStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierStorePort for InMemoryIdentifierStore {
    fn persist(&self, session_id: &SessionId) -> Result<(), IdentifierStoreError> {
        self.entries
            .insert(ACTIVE_SESSION_KEY.to_string(), session_id.as_str().to_string());
        Ok(())
    }

    fn load(&self) -> Result<Option<SessionId>, IdentifierStoreError> {
        match self.entries.get(ACTIVE_SESSION_KEY) {
            Some(value) => SessionId::new(value.clone())
                .map(Some)
                .map_err(|e| IdentifierStoreError::SerializationError(e.to_string())),
            None => Ok(None),
        }
    }

    fn clear(&self) -> Result<(), IdentifierStoreError> {
        self.entries.remove(ACTIVE_SESSION_KEY);
        Ok(())
    }
}
