//! Playback Context - Aggregate Root

use serde::{Deserialize, Serialize};

use super::SpeechSettings;
use crate::domain::document::Document;
use crate::domain::voice::VoiceName;

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackStatus {
    /// 文档已加载，尚未播放
    Idle,
    /// 正在朗读
    Playing,
    /// 已暂停
    Paused,
    /// 已停止（含朗读完成、引擎出错）
    Stopped,
}

impl PlaybackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackStatus::Idle => "idle",
            PlaybackStatus::Playing => "playing",
            PlaybackStatus::Paused => "paused",
            PlaybackStatus::Stopped => "stopped",
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackStatus::Playing)
    }
}

/// PlaybackState 聚合根 - 唯一权威的朗读位置
///
/// 不变量:
/// - `0 <= position <= document.len()`
/// - position 只能通过以下途径改变：播放中的进度事件、seek、stop（归零）、完成（置为 len）
/// - 没有文档时 position 恒为 0
#[derive(Debug, Clone)]
pub struct PlaybackState {
    document: Option<Document>,
    position: usize,
    status: PlaybackStatus,
    settings: SpeechSettings,
    voice: Option<VoiceName>,
    last_error: Option<String>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackState {
    /// 无文档的初始状态
    pub fn new() -> Self {
        Self {
            document: None,
            position: 0,
            status: PlaybackStatus::Idle,
            settings: SpeechSettings::default(),
            voice: None,
            last_error: None,
        }
    }

    /// 整体替换文档
    pub fn load(&mut self, document: Document, position: usize, settings: SpeechSettings) {
        self.position = document.clamp(position);
        self.document = Some(document);
        self.status = PlaybackStatus::Idle;
        self.settings = settings;
        self.last_error = None;
    }

    pub fn mark_playing(&mut self) {
        self.status = PlaybackStatus::Playing;
        self.last_error = None;
    }

    pub fn mark_paused(&mut self) {
        self.status = PlaybackStatus::Paused;
    }

    /// 停止并归零
    pub fn stop(&mut self) {
        self.status = PlaybackStatus::Stopped;
        self.position = 0;
    }

    /// 停止但保留位置
    pub fn halt(&mut self) {
        if self.status != PlaybackStatus::Idle {
            self.status = PlaybackStatus::Stopped;
        }
    }

    /// 跳转，返回截断后的位置
    pub fn seek(&mut self, position: usize) -> usize {
        self.position = self.clamp(position);
        self.position
    }

    /// 应用进度事件
    ///
    /// 仅在播放中生效，返回更新后的位置
    pub fn apply_progress(&mut self, absolute: usize) -> Option<usize> {
        if !self.status.is_playing() {
            return None;
        }
        self.position = self.clamp(absolute);
        Some(self.position)
    }

    /// 朗读完成
    pub fn complete(&mut self) {
        self.status = PlaybackStatus::Stopped;
        self.position = self.len();
    }

    /// 引擎出错：停止播放，但保留位置
    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = PlaybackStatus::Stopped;
        self.last_error = Some(message.into());
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn set_settings(&mut self, settings: SpeechSettings) {
        self.settings = settings;
    }

    pub fn set_voice(&mut self, voice: Option<VoiceName>) {
        self.voice = voice;
    }

    fn clamp(&self, position: usize) -> usize {
        self.document
            .as_ref()
            .map(|d| d.clamp(position))
            .unwrap_or(0)
    }

    // Getters
    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn settings(&self) -> SpeechSettings {
        self.settings
    }

    pub fn voice(&self) -> Option<&VoiceName> {
        self.voice.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// 文档字符长度，无文档时为 0
    pub fn len(&self) -> usize {
        self.document.as_ref().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 对外展示的播放快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSnapshot {
    pub status: PlaybackStatus,
    pub position: usize,
    pub length: usize,
    pub progress_percent: f32,
    pub rate: f32,
    pub pitch: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl PlaybackState {
    pub fn snapshot(&self, session_id: Option<String>) -> PlaybackSnapshot {
        let progress_percent = self
            .document
            .as_ref()
            .map(|d| d.progress_percent(self.position))
            .unwrap_or(0.0);
        PlaybackSnapshot {
            status: self.status,
            position: self.position,
            length: self.len(),
            progress_percent,
            rate: self.settings.rate,
            pitch: self.settings.pitch,
            voice: self.voice.as_ref().map(|v| v.as_str().to_string()),
            session_id,
            last_error: self.last_error.clone(),
        }
    }
}
