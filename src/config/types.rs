//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;

use crate::domain::{Voice, VoiceName};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 远端会话服务
    #[serde(default)]
    pub session_store: SessionStoreConfig,

    /// 上传限制
    #[serde(default)]
    pub upload: UploadConfig,

    /// 朗读引擎
    #[serde(default)]
    pub narration: NarrationConfig,

    /// 播放行为
    #[serde(default)]
    pub playback: PlaybackSettingsConfig,

    /// 本地存储
    #[serde(default)]
    pub storage: StorageConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 远端会话服务配置
#[derive(Debug, Clone, Deserialize)]
pub struct SessionStoreConfig {
    /// 服务基础 URL
    #[serde(default = "default_session_store_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_session_store_timeout")]
    pub timeout_secs: u64,
}

fn default_session_store_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_session_store_timeout() -> u64 {
    30
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self {
            url: default_session_store_url(),
            timeout_secs: default_session_store_timeout(),
        }
    }
}

/// 上传配置
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// 上传文件最大大小（字节），默认 20MB
    #[serde(default = "default_max_upload_size")]
    pub max_size_bytes: u64,
}

fn default_max_upload_size() -> u64 {
    20 * 1024 * 1024 // 20 MB
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: default_max_upload_size(),
        }
    }
}

/// 音色条目
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceEntry {
    pub name: String,

    #[serde(default = "default_voice_lang")]
    pub lang: String,

    #[serde(default)]
    pub default: bool,
}

fn default_voice_lang() -> String {
    "en-US".to_string()
}

impl VoiceEntry {
    /// 名称为空时返回 None
    pub fn to_voice(&self) -> Option<Voice> {
        let name = VoiceName::new(self.name.as_str()).ok()?;
        Some(Voice::new(name, self.lang.as_str()).with_default(self.default))
    }
}

/// 朗读引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct NarrationConfig {
    /// 1.0 倍速下的每分钟词数
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,

    /// 引擎提供的音色
    #[serde(default = "default_voices")]
    pub voices: Vec<VoiceEntry>,
}

fn default_words_per_minute() -> u32 {
    180
}

fn default_voices() -> Vec<VoiceEntry> {
    vec![
        VoiceEntry {
            name: "English (US)".to_string(),
            lang: "en-US".to_string(),
            default: true,
        },
        VoiceEntry {
            name: "English (UK)".to_string(),
            lang: "en-GB".to_string(),
            default: false,
        },
    ]
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            words_per_minute: default_words_per_minute(),
            voices: default_voices(),
        }
    }
}

impl NarrationConfig {
    /// 转换为领域音色列表
    pub fn voice_catalog(&self) -> Vec<Voice> {
        self.voices.iter().filter_map(VoiceEntry::to_voice).collect()
    }
}

/// 播放行为配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaybackSettingsConfig {
    /// 修改语速 / 音调时保留当前位置（默认归零）
    #[serde(default)]
    pub preserve_position_on_settings_change: bool,
}

/// 本地存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Sled 数据库路径（保存当前会话标识）
    #[serde(default = "default_state_path")]
    pub state_path: String,
}

fn default_state_path() -> String {
    "data/state.sled".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
