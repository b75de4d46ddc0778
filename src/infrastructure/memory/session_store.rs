//! In-Memory Session Store Implementation
//!
//! 本地替身：把上传的字节按 UTF-8 视为已提取文本，并记录所有镜像写入

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::application::ports::{
    PdfUpload, SessionStoreError, SessionStorePort, UploadedDocument,
};
use crate::domain::{Document, SessionId, SessionSnapshot, SpeechSettings};

#[derive(Debug, Clone)]
struct StoredSession {
    text: String,
    position: usize,
    settings: SpeechSettings,
}

/// 镜像写入记录
#[derive(Debug, Clone)]
enum MirrorWrite {
    Position(SessionId, usize),
    Settings(SessionId, SpeechSettings),
}

/// 内存会话服务
pub struct InMemorySessionStore {
    sessions: DashMap<String, StoredSession>,
    /// seq -> write，按序号还原写入顺序
    writes: DashMap<u64, MirrorWrite>,
    next_seq: AtomicU64,
    offline: AtomicBool,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            writes: DashMap::new(),
            next_seq: AtomicU64::new(0),
            offline: AtomicBool::new(false),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 直接写入一个会话，返回其标识
    pub fn insert(&self, text: &str, position: usize, settings: SpeechSettings) -> SessionId {
        let id = SessionId::generate();
        self.sessions.insert(
            id.as_str().to_string(),
            StoredSession {
                text: text.to_string(),
                position,
                settings,
            },
        );
        id
    }

    /// 模拟网络不可用
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// 按写入顺序返回位置更新
    pub fn position_updates(&self) -> Vec<(SessionId, usize)> {
        self.ordered_writes()
            .into_iter()
            .filter_map(|w| match w {
                MirrorWrite::Position(id, position) => Some((id, position)),
                MirrorWrite::Settings(..) => None,
            })
            .collect()
    }

    /// 按写入顺序返回参数更新
    pub fn settings_updates(&self) -> Vec<(SessionId, SpeechSettings)> {
        self.ordered_writes()
            .into_iter()
            .filter_map(|w| match w {
                MirrorWrite::Settings(id, settings) => Some((id, settings)),
                MirrorWrite::Position(..) => None,
            })
            .collect()
    }

    fn ordered_writes(&self) -> Vec<MirrorWrite> {
        let mut writes: Vec<(u64, MirrorWrite)> = self
            .writes
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        writes.sort_by_key(|(seq, _)| *seq);
        writes.into_iter().map(|(_, w)| w).collect()
    }

    fn record(&self, write: MirrorWrite) {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.writes.insert(seq, write);
    }

    fn check_online(&self) -> Result<(), SessionStoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(SessionStoreError::NetworkError(
                "session store offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorePort for InMemorySessionStore {
    async fn upload_pdf(&self, upload: PdfUpload) -> Result<UploadedDocument, SessionStoreError> {
        self.check_online()?;
        let text = String::from_utf8_lossy(&upload.bytes).into_owned();
        let settings = SpeechSettings::default();
        let session_id = self.insert(&text, 0, settings);
        tracing::debug!(session_id = %session_id, file_name = %upload.file_name, "Session created");
        Ok(UploadedDocument {
            session_id,
            text,
            settings,
        })
    }

    async fn fetch(&self, session_id: &SessionId) -> Result<SessionSnapshot, SessionStoreError> {
        self.check_online()?;
        let session = self
            .sessions
            .get(session_id.as_str())
            .map(|s| s.clone())
            .ok_or_else(|| SessionStoreError::NotFound(session_id.to_string()))?;
        Ok(SessionSnapshot::new(
            session_id.clone(),
            Document::new(session.text),
            session.position,
            session.settings,
        ))
    }

    async fn update_settings(
        &self,
        session_id: &SessionId,
        settings: SpeechSettings,
    ) -> Result<(), SessionStoreError> {
        self.check_online()?;
        let mut session = self
            .sessions
            .get_mut(session_id.as_str())
            .ok_or_else(|| SessionStoreError::NotFound(session_id.to_string()))?;
        session.settings = settings;
        drop(session);
        self.record(MirrorWrite::Settings(session_id.clone(), settings));
        Ok(())
    }

    async fn update_position(
        &self,
        session_id: &SessionId,
        position: usize,
    ) -> Result<(), SessionStoreError> {
        self.check_online()?;
        let mut session = self
            .sessions
            .get_mut(session_id.as_str())
            .ok_or_else(|| SessionStoreError::NotFound(session_id.to_string()))?;
        session.position = position;
        drop(session);
        self.record(MirrorWrite::Position(session_id.clone(), position));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = InMemorySessionStore::new();

        let uploaded = store
            .upload_pdf(PdfUpload::new("a.pdf", "application/pdf", b"Hello".to_vec()))
            .await
            .unwrap();
        assert_eq!(uploaded.text, "Hello");

        store.update_position(&uploaded.session_id, 3).await.unwrap();
        let settings = SpeechSettings::new(1.25, 0.75).unwrap();
        store
            .update_settings(&uploaded.session_id, settings)
            .await
            .unwrap();

        let snapshot = store.fetch(&uploaded.session_id).await.unwrap();
        assert_eq!(snapshot.position, 3);
        assert_eq!(snapshot.settings, settings);
        assert_eq!(store.position_updates(), vec![(uploaded.session_id.clone(), 3)]);
        assert_eq!(store.settings_updates().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new("nope").unwrap();
        assert!(matches!(
            store.fetch(&id).await,
            Err(SessionStoreError::NotFound(_))
        ));
        assert!(store.update_position(&id, 1).await.is_err());
        assert!(store.position_updates().is_empty());
    }

    #[tokio::test]
    async fn test_offline_fails_every_call() {
        let store = InMemorySessionStore::new();
        let id = store.insert("text", 0, SpeechSettings::default());
        store.set_offline(true);

        assert!(matches!(
            store.fetch(&id).await,
            Err(SessionStoreError::NetworkError(_))
        ));
        assert!(store.update_position(&id, 2).await.is_err());
    }
}
