//! Paced Narration Engine - 按语速节拍模拟的朗读引擎
//!
//! 不产生音频，只按 words_per_minute × rate 的节奏逐词发送进度事件。
//! 用于无语音后端的终端环境与测试，事件语义与真实引擎一致：
//! - 每个 utterance 恰好一个终止事件（Completed / Errored）
//! - 被取消的 utterance 在 cancel() 返回前发出 Errored(Interrupted)，之后不再有事件

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    NarrationEnginePort, NarrationError, NarrationEvent, UtteranceId, UtteranceRequest,
};
use crate::domain::{word_boundaries, Voice, VoiceCatalog};

/// 引擎配置
#[derive(Debug, Clone)]
pub struct PacedEngineConfig {
    /// 1.0 倍速下的每分钟词数
    pub words_per_minute: u32,
    /// 启动时已知的音色
    pub voices: Vec<Voice>,
}

impl Default for PacedEngineConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 180,
            voices: Vec::new(),
        }
    }
}

/// 活动 utterance
struct ActiveUtterance {
    id: UtteranceId,
    cancel: CancellationToken,
    paused: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// 节拍朗读引擎
pub struct PacedNarrationEngine {
    events: mpsc::UnboundedSender<NarrationEvent>,
    words_per_minute: u32,
    active: Mutex<Option<ActiveUtterance>>,
    catalog: RwLock<VoiceCatalog>,
    next_id: AtomicU64,
}

impl PacedNarrationEngine {
    /// 创建引擎，返回事件接收端
    pub fn new(config: PacedEngineConfig) -> (Self, mpsc::UnboundedReceiver<NarrationEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();

        tracing::info!(
            words_per_minute = config.words_per_minute,
            voices = config.voices.len(),
            "PacedNarrationEngine initialized"
        );

        let engine = Self {
            events,
            words_per_minute: config.words_per_minute.max(1),
            active: Mutex::new(None),
            catalog: RwLock::new(VoiceCatalog::new(config.voices)),
            next_id: AtomicU64::new(0),
        };
        (engine, receiver)
    }

    /// 合并一批新到达的音色，并广播完整目录
    pub async fn load_voices(&self, batch: Vec<Voice>) {
        let voices = {
            let mut catalog = self.catalog.write().await;
            catalog.merge(batch);
            catalog.voices().to_vec()
        };
        tracing::debug!(count = voices.len(), "Voice catalog changed");
        let _ = self.events.send(NarrationEvent::VoicesChanged(voices));
    }

    /// 1.0 倍速以外按比例缩放词间隔
    fn word_interval(&self, rate: f32) -> Duration {
        let words_per_minute = self.words_per_minute as f64 * rate.max(f32::EPSILON) as f64;
        Duration::from_secs_f64(60.0 / words_per_minute)
    }

    async fn cancel_locked(slot: &mut Option<ActiveUtterance>) {
        let Some(active) = slot.take() else {
            return;
        };
        active.cancel.cancel();
        if let Err(e) = active.task.await {
            tracing::warn!(utterance = %active.id, error = %e, "Narration task aborted");
        }
        tracing::debug!(utterance = %active.id, "Utterance cancelled");
    }

    async fn with_active<F>(&self, utterance: UtteranceId, f: F) -> Result<(), NarrationError>
    where
        F: FnOnce(&ActiveUtterance),
    {
        let slot = self.active.lock().await;
        match slot.as_ref() {
            Some(active) if active.id == utterance && !active.task.is_finished() => {
                f(active);
                Ok(())
            }
            _ => Err(NarrationError::StaleUtterance(utterance)),
        }
    }
}

#[async_trait]
impl NarrationEnginePort for PacedNarrationEngine {
    async fn start(&self, request: UtteranceRequest) -> Result<UtteranceId, NarrationError> {
        if self.events.is_closed() {
            return Err(NarrationError::Unavailable(
                "event receiver dropped".to_string(),
            ));
        }

        let mut slot = self.active.lock().await;
        Self::cancel_locked(&mut slot).await;

        let voice = {
            let catalog = self.catalog.read().await;
            match request.voice.as_ref() {
                Some(name) if catalog.contains(name) => Some(name.clone()),
                Some(name) => {
                    tracing::warn!(voice = %name, "Unknown voice, using engine default");
                    catalog.default_voice().map(|v| v.name().clone())
                }
                None => catalog.default_voice().map(|v| v.name().clone()),
            }
        };

        let id = UtteranceId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let cancel = CancellationToken::new();
        let (paused, paused_rx) = watch::channel(false);
        let interval = self.word_interval(request.settings.rate);

        tracing::debug!(
            utterance = %id,
            text_len = request.text.chars().count(),
            rate = request.settings.rate,
            pitch = request.settings.pitch,
            voice = ?voice.as_ref().map(|v| v.as_str()),
            interval_ms = interval.as_millis() as u64,
            "Utterance started"
        );

        let task = tokio::spawn(narrate(
            id,
            request.text,
            interval,
            self.events.clone(),
            cancel.clone(),
            paused_rx,
        ));

        *slot = Some(ActiveUtterance {
            id,
            cancel,
            paused,
            task,
        });
        Ok(id)
    }

    async fn pause(&self, utterance: UtteranceId) -> Result<(), NarrationError> {
        self.with_active(utterance, |active| {
            active.paused.send_replace(true);
        })
        .await
    }

    async fn resume(&self, utterance: UtteranceId) -> Result<(), NarrationError> {
        self.with_active(utterance, |active| {
            active.paused.send_replace(false);
        })
        .await
    }

    async fn cancel(&self) {
        let mut slot = self.active.lock().await;
        Self::cancel_locked(&mut slot).await;
    }

    async fn voices(&self) -> Vec<Voice> {
        self.catalog.read().await.voices().to_vec()
    }
}

/// 朗读任务：逐词发送进度，最后发送一个终止事件
async fn narrate(
    id: UtteranceId,
    text: String,
    interval: Duration,
    events: mpsc::UnboundedSender<NarrationEvent>,
    cancel: CancellationToken,
    mut paused: watch::Receiver<bool>,
) {
    let interrupted = NarrationEvent::Errored {
        utterance: id,
        error: NarrationError::Interrupted,
    };

    for boundary in word_boundaries(&text) {
        if !wait_until_resumed(&cancel, &mut paused).await {
            let _ = events.send(interrupted);
            return;
        }

        let _ = events.send(NarrationEvent::Progress {
            utterance: id,
            char_index: boundary.char_index,
        });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let _ = events.send(interrupted);
                return;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }

    if !wait_until_resumed(&cancel, &mut paused).await {
        let _ = events.send(interrupted);
        return;
    }
    let _ = events.send(NarrationEvent::Completed { utterance: id });
}

/// 暂停时阻塞；被取消返回 false
async fn wait_until_resumed(cancel: &CancellationToken, paused: &mut watch::Receiver<bool>) -> bool {
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        if !*paused.borrow_and_update() {
            return true;
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            changed = paused.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
        }
    }
}
