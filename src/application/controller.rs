//! Playback Controller - 播放控制器
//!
//! 持有唯一权威的朗读位置与播放状态机，向朗读引擎下发命令，
//! 并通过 SessionMirror 把位置 / 参数同步到远端。
//!
//! 所有状态变更发生在同一逻辑线程上（见 infrastructure::runtime::PlayerLoop），
//! 因此这里不需要锁；正确性依赖于按 UtteranceId 丢弃过期事件

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::mirror::SessionMirror;
use crate::application::ports::{
    NarrationEnginePort, NarrationError, NarrationEvent, UploadedDocument, UtteranceId,
    UtteranceRequest,
};
use crate::domain::{
    Document, PlaybackError, PlaybackSnapshot, PlaybackState, PlaybackStatus, SpeechSettings, Voice,
    VoiceCatalog,
};

/// 控制器配置
#[derive(Debug, Clone, Default)]
pub struct PlaybackConfig {
    /// 修改语速 / 音调时保留位置（默认与停止一致：归零）
    pub preserve_position_on_settings_change: bool,
}

/// 当前活动的 utterance
#[derive(Debug, Clone, Copy)]
struct ActiveUtterance {
    id: UtteranceId,
    /// 该 utterance 文本切片在文档中的起始字符偏移
    start_offset: usize,
}

/// 播放控制器
pub struct PlaybackController {
    engine: Arc<dyn NarrationEnginePort>,
    mirror: SessionMirror,
    config: PlaybackConfig,
    state: PlaybackState,
    voices: VoiceCatalog,
    active: Option<ActiveUtterance>,
}

impl PlaybackController {
    pub fn new(
        engine: Arc<dyn NarrationEnginePort>,
        mirror: SessionMirror,
        config: PlaybackConfig,
    ) -> Self {
        Self {
            engine,
            mirror,
            config,
            state: PlaybackState::new(),
            voices: VoiceCatalog::default(),
            active: None,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn voices(&self) -> &VoiceCatalog {
        &self.voices
    }

    pub fn mirror(&self) -> &SessionMirror {
        &self.mirror
    }

    pub fn active_utterance(&self) -> Option<UtteranceId> {
        self.active.map(|a| a.id)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let session_id = self.mirror.session_id().map(|id| id.to_string());
        self.state.snapshot(session_id)
    }

    /// 启动时从远端恢复会话
    ///
    /// 失败时保持无文档的初始状态
    pub async fn rehydrate(&mut self) -> bool {
        let Some(snapshot) = self.mirror.rehydrate().await else {
            return false;
        };
        self.cancel_active().await;
        self.state
            .load(snapshot.document, snapshot.position, snapshot.settings);
        true
    }

    /// 上传成功：整体替换文档，位置归零，采用服务端参数
    pub async fn load_uploaded(&mut self, uploaded: UploadedDocument) {
        self.cancel_active().await;
        let document = Document::new(uploaded.text);
        tracing::info!(
            session_id = %uploaded.session_id,
            length = document.len(),
            rate = uploaded.settings.rate,
            pitch = uploaded.settings.pitch,
            "Document loaded"
        );
        self.state.load(document, 0, uploaded.settings);
        self.mirror.establish(uploaded.session_id);
    }

    /// 播放 / 暂停切换
    pub async fn play(&mut self) -> Result<(), ApplicationError> {
        if self.state.document().is_none() {
            return Err(PlaybackError::NoDocument.into());
        }
        if self.state.status().is_playing() {
            return self.pause().await;
        }
        self.start_from(self.state.position()).await
    }

    /// 暂停，位置冻结在最后一次进度
    pub async fn pause(&mut self) -> Result<(), ApplicationError> {
        if !self.state.status().is_playing() {
            tracing::debug!(status = self.state.status().as_str(), "Pause ignored");
            return Ok(());
        }
        if let Some(active) = self.active {
            match self.engine.pause(active.id).await {
                Ok(()) => {}
                // 已结束但终止事件尚未派发
                Err(NarrationError::StaleUtterance(id)) => {
                    tracing::debug!(utterance = %id, "Utterance already finished, pausing in place");
                    self.active = None;
                }
                Err(e) => return Err(e.into()),
            }
        }
        self.state.mark_paused();
        tracing::debug!(position = self.state.position(), "Playback paused");
        Ok(())
    }

    /// 恢复
    ///
    /// 仅在暂停且引擎 utterance 仍存活时有效，否则为空操作
    pub async fn resume(&mut self) -> Result<(), ApplicationError> {
        if self.state.status() != PlaybackStatus::Paused {
            tracing::debug!(status = self.state.status().as_str(), "Resume ignored");
            return Ok(());
        }
        let Some(active) = self.active else {
            tracing::debug!("No live utterance, resume ignored");
            return Ok(());
        };

        match self.engine.resume(active.id).await {
            Ok(()) => {
                self.state.mark_playing();
                tracing::debug!(utterance = %active.id, "Playback resumed");
                Ok(())
            }
            Err(NarrationError::StaleUtterance(id)) => {
                tracing::debug!(utterance = %id, "Utterance no longer live, resume ignored");
                self.active = None;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 停止：取消朗读、位置归零并同步（幂等）
    pub async fn stop(&mut self) {
        self.cancel_active().await;
        self.state.stop();
        self.mirror.push_position(0);
        tracing::debug!("Playback stopped");
    }

    /// 跳转到指定位置（截断到 `[0, len]`）
    ///
    /// 播放中会取消当前 utterance，待引擎确认取消后在新位置重新开始
    pub async fn seek(&mut self, position: usize) -> Result<usize, ApplicationError> {
        if self.state.document().is_none() {
            return Err(PlaybackError::NoDocument.into());
        }

        let status = self.state.status();
        let target = self.state.seek(position);
        self.mirror.push_position(target);

        tracing::debug!(requested = position, position = target, status = status.as_str(), "Seek");

        match status {
            PlaybackStatus::Playing => {
                self.cancel_active().await;
                self.start_from(target).await?;
            }
            // 暂停中的 utterance 起点已失效
            PlaybackStatus::Paused => self.cancel_active().await,
            PlaybackStatus::Idle | PlaybackStatus::Stopped => {}
        }

        Ok(target)
    }

    /// 修改语速：先完整停止，再应用并同步，不会自动重新播放
    pub async fn change_rate(&mut self, rate: f32) -> Result<(), ApplicationError> {
        let settings = self.state.settings().with_rate(rate)?;
        self.apply_settings(settings).await;
        Ok(())
    }

    /// 修改音调：同 change_rate
    pub async fn change_pitch(&mut self, pitch: f32) -> Result<(), ApplicationError> {
        let settings = self.state.settings().with_pitch(pitch)?;
        self.apply_settings(settings).await;
        Ok(())
    }

    /// 切换音色，只影响下一次 utterance
    pub fn change_voice(&mut self, name: &str) -> Result<(), ApplicationError> {
        let voice = self
            .voices
            .find(name)
            .ok_or_else(|| PlaybackError::VoiceNotFound(name.to_string()))?;
        tracing::debug!(voice = %voice.name(), "Voice changed");
        self.state.set_voice(Some(voice.name().clone()));
        Ok(())
    }

    /// 从引擎拉取当前音色目录
    pub async fn refresh_voices(&mut self) {
        let voices = self.engine.voices().await;
        self.update_voices(voices);
    }

    /// 退出前取消朗读，保留位置（不同步归零）
    pub async fn shutdown(&mut self) {
        self.cancel_active().await;
        self.state.halt();
        tracing::debug!(position = self.state.position(), "Controller shut down");
    }

    /// 处理引擎事件
    ///
    /// 返回 Ok(true) 表示状态发生变化；引擎错误以 Err 返回，供界面展示
    pub fn handle_event(&mut self, event: NarrationEvent) -> Result<bool, ApplicationError> {
        if let NarrationEvent::VoicesChanged(voices) = event {
            self.update_voices(voices);
            return Ok(true);
        }

        let Some(active) = self.active else {
            tracing::trace!(event = ?event, "Discarding event without active utterance");
            return Ok(false);
        };
        if event.utterance() != Some(active.id) {
            tracing::debug!(
                event = ?event,
                active = %active.id,
                "Discarding stale narration event"
            );
            return Ok(false);
        }

        match event {
            NarrationEvent::Progress { char_index, .. } => {
                let absolute = active.start_offset.saturating_add(char_index);
                match self.state.apply_progress(absolute) {
                    Some(position) => {
                        self.mirror.push_position(position);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            NarrationEvent::Completed { .. } => {
                self.active = None;
                self.state.complete();
                tracing::info!(utterance = %active.id, "Narration completed");
                Ok(true)
            }
            NarrationEvent::Errored {
                error: NarrationError::Interrupted,
                ..
            } => {
                self.active = None;
                self.state.halt();
                Ok(true)
            }
            NarrationEvent::Errored { error, .. } => {
                self.active = None;
                self.state.fail(error.to_string());
                tracing::warn!(
                    utterance = %active.id,
                    position = self.state.position(),
                    error = %error,
                    "Narration failed"
                );
                Err(error.into())
            }
            NarrationEvent::VoicesChanged(_) => Ok(false),
        }
    }

    /// 记录用户可见错误（上传失败等）
    pub fn report_error(&mut self, error: &ApplicationError) {
        self.state.set_error(error.to_string());
    }

    async fn start_from(&mut self, offset: usize) -> Result<(), ApplicationError> {
        let document = self.state.document().ok_or(PlaybackError::NoDocument)?;
        let request = UtteranceRequest {
            text: document.slice_from(offset).to_string(),
            settings: self.state.settings(),
            voice: self.state.voice().cloned(),
        };

        // 旧句柄的事件从此刻起一律视为过期
        self.active = None;

        match self.engine.start(request).await {
            Ok(id) => {
                self.active = Some(ActiveUtterance {
                    id,
                    start_offset: offset,
                });
                self.state.mark_playing();
                tracing::info!(utterance = %id, offset = offset, "Narration started");
                Ok(())
            }
            Err(e) => {
                self.state.fail(e.to_string());
                tracing::warn!(offset = offset, error = %e, "Failed to start narration");
                Err(e.into())
            }
        }
    }

    async fn apply_settings(&mut self, settings: SpeechSettings) {
        self.cancel_active().await;
        if self.config.preserve_position_on_settings_change {
            self.state.halt();
        } else {
            self.state.stop();
            self.mirror.push_position(0);
        }
        self.state.set_settings(settings);
        self.mirror.push_settings(settings);
        tracing::debug!(rate = settings.rate, pitch = settings.pitch, "Speech settings applied");
    }

    async fn cancel_active(&mut self) {
        self.active = None;
        self.engine.cancel().await;
    }

    fn update_voices(&mut self, voices: Vec<Voice>) {
        self.voices = VoiceCatalog::new(voices);
        let selected_still_offered = self
            .state
            .voice()
            .map(|v| self.voices.contains(v))
            .unwrap_or(false);
        if !selected_still_offered {
            let default = self.voices.default_voice().map(|v| v.name().clone());
            self.state.set_voice(default);
        }
        tracing::debug!(
            count = self.voices.len(),
            selected = ?self.state.voice().map(|v| v.as_str()),
            "Voice catalog updated"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::application::ports::{IdentifierStorePort, SessionStorePort};
    use crate::domain::{SessionId, VoiceName};
    use crate::infrastructure::memory::{InMemoryIdentifierStore, InMemorySessionStore};

    /// 记录调用的引擎替身，事件由测试直接注入控制器
    #[derive(Default)]
    struct ScriptedEngine {
        inner: Mutex<ScriptedState>,
    }

    #[derive(Default)]
    struct ScriptedState {
        next_id: u64,
        active: Option<UtteranceId>,
        paused: bool,
        started: Vec<UtteranceRequest>,
        cancels: usize,
        fail_start: bool,
    }

    impl ScriptedEngine {
        fn started(&self) -> Vec<UtteranceRequest> {
            self.inner.lock().unwrap().started.clone()
        }

        fn cancels(&self) -> usize {
            self.inner.lock().unwrap().cancels
        }

        fn is_paused(&self) -> bool {
            self.inner.lock().unwrap().paused
        }

        fn set_fail_start(&self, fail: bool) {
            self.inner.lock().unwrap().fail_start = fail;
        }
    }

    #[async_trait]
    impl NarrationEnginePort for ScriptedEngine {
        async fn start(&self, request: UtteranceRequest) -> Result<UtteranceId, NarrationError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.fail_start {
                return Err(NarrationError::Unavailable("no speech backend".to_string()));
            }
            if inner.active.take().is_some() {
                inner.cancels += 1;
            }
            inner.next_id += 1;
            let id = UtteranceId::new(inner.next_id);
            inner.active = Some(id);
            inner.paused = false;
            inner.started.push(request);
            Ok(id)
        }

        async fn pause(&self, utterance: UtteranceId) -> Result<(), NarrationError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.active != Some(utterance) {
                return Err(NarrationError::StaleUtterance(utterance));
            }
            inner.paused = true;
            Ok(())
        }

        async fn resume(&self, utterance: UtteranceId) -> Result<(), NarrationError> {
            let mut inner = self.inner.lock().unwrap();
            if inner.active != Some(utterance) {
                return Err(NarrationError::StaleUtterance(utterance));
            }
            inner.paused = false;
            Ok(())
        }

        async fn cancel(&self) {
            let mut inner = self.inner.lock().unwrap();
            if inner.active.take().is_some() {
                inner.cancels += 1;
            }
            inner.paused = false;
        }

        async fn voices(&self) -> Vec<Voice> {
            Vec::new()
        }
    }

    struct Harness {
        controller: PlaybackController,
        engine: Arc<ScriptedEngine>,
        store: Arc<InMemorySessionStore>,
        identifiers: Arc<InMemoryIdentifierStore>,
    }

    fn harness_with(config: PlaybackConfig) -> Harness {
        let engine = Arc::new(ScriptedEngine::default());
        let store = Arc::new(InMemorySessionStore::new());
        let identifiers = Arc::new(InMemoryIdentifierStore::new());
        let mirror = SessionMirror::new(store.clone(), identifiers.clone());
        let controller = PlaybackController::new(engine.clone(), mirror, config);
        Harness {
            controller,
            engine,
            store,
            identifiers,
        }
    }

    fn harness() -> Harness {
        harness_with(PlaybackConfig::default())
    }

    async fn upload(h: &mut Harness, text: &str) -> SessionId {
        let session_id = h.store.insert(text, 0, SpeechSettings::default());
        h.controller
            .load_uploaded(UploadedDocument {
                session_id: session_id.clone(),
                text: text.to_string(),
                settings: SpeechSettings::default(),
            })
            .await;
        session_id
    }

    fn progress(id: UtteranceId, char_index: usize) -> NarrationEvent {
        NarrationEvent::Progress {
            utterance: id,
            char_index,
        }
    }

    fn active(h: &Harness) -> UtteranceId {
        h.controller.active_utterance().expect("active utterance")
    }

    /// 让 fire-and-forget 的镜像任务跑完
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn test_hello_world_scenario() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;
        assert_eq!(h.controller.state().position(), 0);
        assert_eq!(h.controller.state().document().unwrap().text(), "Hello world");

        h.controller.play().await.unwrap();
        assert_eq!(h.controller.state().status(), PlaybackStatus::Playing);
        let id = active(&h);

        assert!(h.controller.handle_event(progress(id, 6)).unwrap());
        assert_eq!(h.controller.state().position(), 6);

        h.controller.pause().await.unwrap();
        assert_eq!(h.controller.state().status(), PlaybackStatus::Paused);
        assert_eq!(h.controller.state().position(), 6);
        assert!(h.engine.is_paused());

        h.controller.resume().await.unwrap();
        assert_eq!(h.controller.state().status(), PlaybackStatus::Playing);
        assert!(!h.engine.is_paused());

        h.controller
            .handle_event(NarrationEvent::Completed { utterance: id })
            .unwrap();
        assert!(!h.controller.state().status().is_playing());
        assert_eq!(h.controller.state().position(), 11);
        assert!(h.controller.active_utterance().is_none());
    }

    #[tokio::test]
    async fn test_play_without_document_fails() {
        let mut h = harness();
        let err = h.controller.play().await.unwrap_err();
        assert!(matches!(err, ApplicationError::Playback(PlaybackError::NoDocument)));
        assert!(h.engine.started().is_empty());
    }

    #[tokio::test]
    async fn test_play_toggles_to_pause() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;

        h.controller.play().await.unwrap();
        h.controller.play().await.unwrap();

        assert_eq!(h.controller.state().status(), PlaybackStatus::Paused);
        assert_eq!(h.engine.started().len(), 1);
    }

    #[tokio::test]
    async fn test_play_from_paused_restarts_at_position() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        let first = active(&h);
        h.controller.handle_event(progress(first, 6)).unwrap();
        h.controller.pause().await.unwrap();

        h.controller.play().await.unwrap();

        let started = h.engine.started();
        assert_eq!(started.len(), 2);
        assert_eq!(started[1].text, "world");
        assert_ne!(active(&h), first);
        // 暂停中的 utterance 被新的一次取代
        assert_eq!(h.engine.cancels(), 1);
    }

    #[tokio::test]
    async fn test_progress_is_offset_by_utterance_start() {
        let mut h = harness();
        upload(&mut h, "one two three four").await;
        h.controller.seek(4).await.unwrap();
        h.controller.play().await.unwrap();
        assert_eq!(h.engine.started()[0].text, "two three four");

        let id = active(&h);
        h.controller.handle_event(progress(id, 4)).unwrap();
        assert_eq!(h.controller.state().position(), 8);
    }

    #[tokio::test]
    async fn test_progress_beyond_length_is_clamped() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        let id = active(&h);

        h.controller.handle_event(progress(id, 500)).unwrap();
        assert_eq!(h.controller.state().position(), 11);
    }

    #[tokio::test]
    async fn test_progress_while_paused_is_ignored() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        let id = active(&h);
        h.controller.handle_event(progress(id, 2)).unwrap();
        h.controller.pause().await.unwrap();

        assert!(!h.controller.handle_event(progress(id, 6)).unwrap());
        assert_eq!(h.controller.state().position(), 2);
    }

    #[tokio::test]
    async fn test_progress_is_mirrored() {
        let mut h = harness();
        let session_id = upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        let id = active(&h);

        h.controller.handle_event(progress(id, 6)).unwrap();
        settle().await;

        assert!(h.store.position_updates().contains(&(session_id, 6)));
    }

    #[tokio::test]
    async fn test_seek_sets_exact_position() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;

        for p in 0..=11 {
            assert_eq!(h.controller.seek(p).await.unwrap(), p);
            assert_eq!(h.controller.state().position(), p);
        }
        assert_eq!(h.controller.seek(99).await.unwrap(), 11);
        assert_eq!(h.controller.state().position(), 11);
    }

    #[tokio::test]
    async fn test_seek_while_stopped_mirrors_without_starting() {
        let mut h = harness();
        let session_id = upload(&mut h, "Hello world").await;

        h.controller.seek(3).await.unwrap();
        settle().await;

        assert!(h.engine.started().is_empty());
        assert!(h.store.position_updates().contains(&(session_id, 3)));
    }

    #[tokio::test]
    async fn test_seek_while_playing_restarts_and_discards_stale_events() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        let old = active(&h);
        h.controller.handle_event(progress(old, 6)).unwrap();

        h.controller.seek(5).await.unwrap();

        let started = h.engine.started();
        assert_eq!(started.len(), 2);
        assert_eq!(started[1].text, " world");
        assert_eq!(h.engine.cancels(), 1);
        assert_eq!(h.controller.state().status(), PlaybackStatus::Playing);
        assert_eq!(h.controller.state().position(), 5);

        // 旧 utterance 的迟到事件被丢弃
        assert!(!h.controller.handle_event(progress(old, 6)).unwrap());
        assert!(!h
            .controller
            .handle_event(NarrationEvent::Completed { utterance: old })
            .unwrap());
        assert_eq!(h.controller.state().position(), 5);
        assert_eq!(h.controller.state().status(), PlaybackStatus::Playing);

        let new = active(&h);
        h.controller.handle_event(progress(new, 1)).unwrap();
        assert_eq!(h.controller.state().position(), 6);
    }

    #[tokio::test]
    async fn test_seek_while_paused_drops_paused_utterance() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        h.controller.pause().await.unwrap();

        h.controller.seek(3).await.unwrap();

        assert!(h.controller.active_utterance().is_none());
        assert_eq!(h.controller.state().status(), PlaybackStatus::Paused);
        h.controller.resume().await.unwrap();
        assert_eq!(h.controller.state().status(), PlaybackStatus::Paused);

        h.controller.play().await.unwrap();
        assert_eq!(h.engine.started()[1].text, "lo world");
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let mut h = harness();
        let session_id = upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        let id = active(&h);
        h.controller.handle_event(progress(id, 6)).unwrap();

        for _ in 0..3 {
            h.controller.stop().await;
            assert_eq!(h.controller.state().position(), 0);
            assert_eq!(h.controller.state().status(), PlaybackStatus::Stopped);
        }
        settle().await;

        assert_eq!(h.engine.cancels(), 1);
        assert_eq!(h.store.fetch(&session_id).await.unwrap().position, 0);
    }

    #[tokio::test]
    async fn test_stop_without_document_is_safe() {
        let mut h = harness();
        h.controller.stop().await;
        assert_eq!(h.controller.state().position(), 0);
        assert!(!h.controller.state().status().is_playing());
    }

    #[tokio::test]
    async fn test_resume_after_stop_is_noop() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        h.controller.stop().await;

        h.controller.resume().await.unwrap();
        assert_eq!(h.controller.state().status(), PlaybackStatus::Stopped);
    }

    #[tokio::test]
    async fn test_rate_change_stops_and_resets_position() {
        let mut h = harness();
        let session_id = upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        let id = active(&h);
        h.controller.handle_event(progress(id, 6)).unwrap();

        h.controller.change_rate(1.5).await.unwrap();
        settle().await;

        assert_eq!(h.controller.state().position(), 0);
        assert!(!h.controller.state().status().is_playing());
        assert_eq!(h.controller.state().settings().rate, 1.5);
        assert!(h.controller.active_utterance().is_none());
        assert_eq!(h.engine.started().len(), 1);
        assert_eq!(
            h.store.settings_updates(),
            vec![(session_id, SpeechSettings::new(1.5, 1.0).unwrap())]
        );

        // 暂停状态已失效，resume 不会恢复
        h.controller.resume().await.unwrap();
        assert!(!h.controller.state().status().is_playing());
    }

    #[tokio::test]
    async fn test_pitch_change_stops_and_resets_position() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        let id = active(&h);
        h.controller.handle_event(progress(id, 6)).unwrap();

        h.controller.change_pitch(0.7).await.unwrap();

        assert_eq!(h.controller.state().position(), 0);
        assert_eq!(h.controller.state().status(), PlaybackStatus::Stopped);
        assert_eq!(h.controller.state().settings().pitch, 0.7);

        h.controller.play().await.unwrap();
        assert_eq!(h.engine.started()[1].settings.pitch, 0.7);
    }

    #[tokio::test]
    async fn test_invalid_rate_changes_nothing() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();

        let err = h.controller.change_rate(2.5).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Playback(PlaybackError::InvalidSetting { .. })
        ));
        assert_eq!(h.controller.state().status(), PlaybackStatus::Playing);
        assert_eq!(h.controller.state().settings().rate, 1.0);
    }

    #[tokio::test]
    async fn test_settings_change_can_preserve_position() {
        let mut h = harness_with(PlaybackConfig {
            preserve_position_on_settings_change: true,
        });
        upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        let id = active(&h);
        h.controller.handle_event(progress(id, 6)).unwrap();

        h.controller.change_rate(0.8).await.unwrap();

        assert_eq!(h.controller.state().position(), 6);
        assert_eq!(h.controller.state().status(), PlaybackStatus::Stopped);
    }

    #[tokio::test]
    async fn test_engine_error_preserves_position() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        let id = active(&h);
        h.controller.handle_event(progress(id, 6)).unwrap();

        let err = h
            .controller
            .handle_event(NarrationEvent::Errored {
                utterance: id,
                error: NarrationError::Synthesis("device lost".to_string()),
            })
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Narration(_)));
        assert_eq!(h.controller.state().position(), 6);
        assert!(!h.controller.state().status().is_playing());
        assert!(h.controller.state().last_error().is_some());

        // 可以从原位置重试
        h.controller.play().await.unwrap();
        assert_eq!(h.engine.started()[1].text, "world");
        assert!(h.controller.state().last_error().is_none());
    }

    #[tokio::test]
    async fn test_start_failure_is_reported() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;
        h.engine.set_fail_start(true);

        assert!(h.controller.play().await.is_err());
        assert!(!h.controller.state().status().is_playing());
        assert!(h.controller.state().last_error().is_some());
    }

    #[tokio::test]
    async fn test_voices_changed_selects_default() {
        let mut h = harness();
        let voices = vec![
            Voice::new(VoiceName::new("Alice").unwrap(), "en-US"),
            Voice::new(VoiceName::new("Bob").unwrap(), "en-GB"),
        ];

        h.controller
            .handle_event(NarrationEvent::VoicesChanged(voices.clone()))
            .unwrap();
        assert_eq!(h.controller.state().voice().unwrap().as_str(), "Alice");

        h.controller.change_voice("Bob").unwrap();
        h.controller
            .handle_event(NarrationEvent::VoicesChanged(voices))
            .unwrap();
        assert_eq!(h.controller.state().voice().unwrap().as_str(), "Bob");

        let err = h.controller.change_voice("Carol").unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Playback(PlaybackError::VoiceNotFound(_))
        ));
        assert_eq!(h.controller.state().voice().unwrap().as_str(), "Bob");
    }

    #[tokio::test]
    async fn test_voice_change_applies_to_next_utterance() {
        let mut h = harness();
        h.controller
            .handle_event(NarrationEvent::VoicesChanged(vec![
                Voice::new(VoiceName::new("Alice").unwrap(), "en-US"),
                Voice::new(VoiceName::new("Bob").unwrap(), "en-GB"),
            ]))
            .unwrap();
        upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();

        h.controller.change_voice("Bob").unwrap();
        assert_eq!(h.engine.started().len(), 1);
        assert_eq!(h.controller.state().status(), PlaybackStatus::Playing);

        h.controller.stop().await;
        h.controller.play().await.unwrap();
        let started = h.engine.started();
        assert_eq!(started[0].voice.as_ref().unwrap().as_str(), "Alice");
        assert_eq!(started[1].voice.as_ref().unwrap().as_str(), "Bob");
    }

    #[tokio::test]
    async fn test_new_upload_cancels_and_replaces_document() {
        let mut h = harness();
        upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        let old = active(&h);

        let second = upload(&mut h, "Another text").await;

        assert_eq!(h.engine.cancels(), 1);
        assert_eq!(h.controller.state().status(), PlaybackStatus::Idle);
        assert_eq!(h.controller.state().position(), 0);
        assert_eq!(h.controller.snapshot().session_id, Some(second.to_string()));
        assert!(!h.controller.handle_event(progress(old, 3)).unwrap());
    }

    #[tokio::test]
    async fn test_rehydrate_restores_fetched_session() {
        let mut h = harness();
        let settings = SpeechSettings::new(1.2, 0.9).unwrap();
        let session_id = h.store.insert("Hello world", 6, settings);
        h.identifiers.persist(&session_id).unwrap();

        assert!(h.controller.rehydrate().await);

        let state = h.controller.state();
        assert_eq!(state.document().unwrap().text(), "Hello world");
        assert_eq!(state.position(), 6);
        assert_eq!(state.settings(), settings);
        assert_eq!(state.status(), PlaybackStatus::Idle);
    }

    #[tokio::test]
    async fn test_rehydrate_failure_leaves_initial_state() {
        let mut h = harness();
        h.identifiers
            .persist(&SessionId::new("stale").unwrap())
            .unwrap();

        assert!(!h.controller.rehydrate().await);

        assert!(h.controller.state().document().is_none());
        assert!(h.controller.snapshot().session_id.is_none());
        assert_eq!(h.identifiers.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_shutdown_keeps_position_and_mirror() {
        let mut h = harness();
        let session_id = upload(&mut h, "Hello world").await;
        h.controller.play().await.unwrap();
        let id = active(&h);
        h.controller.handle_event(progress(id, 6)).unwrap();
        settle().await;

        h.controller.shutdown().await;
        settle().await;

        assert_eq!(h.controller.state().position(), 6);
        assert!(!h.controller.state().status().is_playing());
        assert!(h.controller.active_utterance().is_none());
        assert_eq!(h.engine.cancels(), 1);
        assert_eq!(h.store.fetch(&session_id).await.unwrap().position, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_after_engine_finished_is_quiet() {
        use crate::infrastructure::adapters::{PacedEngineConfig, PacedNarrationEngine};

        let (engine, mut events) = PacedNarrationEngine::new(PacedEngineConfig {
            words_per_minute: 60,
            voices: Vec::new(),
        });
        let store = Arc::new(InMemorySessionStore::new());
        let mirror = SessionMirror::new(store.clone(), Arc::new(InMemoryIdentifierStore::new()));
        let mut controller =
            PlaybackController::new(Arc::new(engine), mirror, PlaybackConfig::default());
        let session_id = store.insert("Hi", 0, SpeechSettings::default());
        controller
            .load_uploaded(UploadedDocument {
                session_id,
                text: "Hi".to_string(),
                settings: SpeechSettings::default(),
            })
            .await;

        controller.play().await.unwrap();
        // 引擎已跑完，Completed 仍在通道里未派发
        tokio::time::sleep(Duration::from_secs(3)).await;

        controller.pause().await.unwrap();
        assert_eq!(controller.state().status(), PlaybackStatus::Paused);
        assert!(controller.active_utterance().is_none());
        assert!(controller.state().last_error().is_none());

        while let Ok(event) = events.try_recv() {
            assert!(!controller.handle_event(event).unwrap());
        }
        assert_eq!(controller.state().status(), PlaybackStatus::Paused);
        assert_eq!(controller.state().position(), 0);
    }
}
