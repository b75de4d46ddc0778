//! Session Mirror - 会话镜像
//!
//! 尽力而为地把位置 / 参数同步到远端会话服务，并在启动时从远端恢复状态。
//! 推送是 fire-and-forget：失败只记录日志，不重试，也不阻塞播放

use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::application::ports::{IdentifierStorePort, SessionStorePort};
use crate::domain::{SessionId, SessionSnapshot, SpeechSettings};

/// 会话镜像
pub struct SessionMirror {
    store: Arc<dyn SessionStorePort>,
    identifiers: Arc<dyn IdentifierStorePort>,
    session_id: Option<SessionId>,
}

impl SessionMirror {
    pub fn new(store: Arc<dyn SessionStorePort>, identifiers: Arc<dyn IdentifierStorePort>) -> Self {
        Self {
            store,
            identifiers,
            session_id: None,
        }
    }

    /// 当前会话标识
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// 建立会话：设为当前会话并持久化标识
    pub fn establish(&mut self, session_id: SessionId) {
        if let Err(e) = self.identifiers.persist(&session_id) {
            tracing::warn!(session_id = %session_id, error = %e, "Failed to persist session identifier");
        }
        tracing::info!(session_id = %session_id, "Session established");
        self.session_id = Some(session_id);
    }

    /// 推送位置（fire-and-forget）
    ///
    /// 没有会话时不做任何事
    pub fn push_position(&self, position: usize) -> Option<JoinHandle<()>> {
        let session_id = self.session_id.clone()?;
        let store = self.store.clone();

        Some(tokio::spawn(async move {
            match store.update_position(&session_id, position).await {
                Ok(()) => {
                    tracing::trace!(session_id = %session_id, position = position, "Position mirrored")
                }
                Err(e) => tracing::warn!(
                    session_id = %session_id,
                    position = position,
                    error = %e,
                    "Failed to mirror position"
                ),
            }
        }))
    }

    /// 推送朗读参数（fire-and-forget）
    pub fn push_settings(&self, settings: SpeechSettings) -> Option<JoinHandle<()>> {
        let session_id = self.session_id.clone()?;
        let store = self.store.clone();

        Some(tokio::spawn(async move {
            match store.update_settings(&session_id, settings).await {
                Ok(()) => tracing::debug!(
                    session_id = %session_id,
                    rate = settings.rate,
                    pitch = settings.pitch,
                    "Speech settings mirrored"
                ),
                Err(e) => tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to mirror speech settings"
                ),
            }
        }))
    }

    /// 启动时恢复会话
    ///
    /// 任意失败（网络错误或会话不存在）都会清除本地标识并返回 None
    pub async fn rehydrate(&mut self) -> Option<SessionSnapshot> {
        let session_id = match self.identifiers.load() {
            Ok(Some(id)) => id,
            Ok(None) => {
                tracing::debug!("No persisted session identifier");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted session identifier");
                return None;
            }
        };

        match self.store.fetch(&session_id).await {
            Ok(snapshot) => {
                tracing::info!(
                    session_id = %session_id,
                    position = snapshot.position,
                    length = snapshot.document.len(),
                    "Session rehydrated"
                );
                self.session_id = Some(session_id);
                Some(snapshot)
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Failed to load session");
                if let Err(e) = self.identifiers.clear() {
                    tracing::warn!(error = %e, "Failed to clear session identifier");
                }
                self.session_id = None;
                None
            }
        }
    }
}
