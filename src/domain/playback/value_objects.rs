//! Playback Context - Value Objects

use serde::{Deserialize, Serialize};

use super::PlaybackError;

/// 语速 / 音调下限
pub const MIN_SETTING: f32 = 0.5;
/// 语速 / 音调上限
pub const MAX_SETTING: f32 = 2.0;
/// 默认语速 / 音调
pub const DEFAULT_SETTING: f32 = 1.0;

/// 朗读参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechSettings {
    /// 语速 (0.5 - 2.0)
    pub rate: f32,
    /// 音调 (0.5 - 2.0)
    pub pitch: f32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            rate: DEFAULT_SETTING,
            pitch: DEFAULT_SETTING,
        }
    }
}

impl SpeechSettings {
    pub fn new(rate: f32, pitch: f32) -> Result<Self, PlaybackError> {
        let settings = Self { rate, pitch };
        settings.validate()?;
        Ok(settings)
    }

    /// 规范化服务端下发的参数
    ///
    /// 缺失或为 0 时取默认值 1.0，越界时截断到合法区间
    pub fn from_remote(rate: Option<f32>, pitch: Option<f32>) -> Self {
        Self {
            rate: normalize_remote(rate),
            pitch: normalize_remote(pitch),
        }
    }

    pub fn validate(&self) -> Result<(), PlaybackError> {
        check_range("rate", self.rate)?;
        check_range("pitch", self.pitch)?;
        Ok(())
    }

    pub fn with_rate(self, rate: f32) -> Result<Self, PlaybackError> {
        check_range("rate", rate)?;
        Ok(Self { rate, ..self })
    }

    pub fn with_pitch(self, pitch: f32) -> Result<Self, PlaybackError> {
        check_range("pitch", pitch)?;
        Ok(Self { pitch, ..self })
    }
}

fn check_range(name: &'static str, value: f32) -> Result<(), PlaybackError> {
    if !value.is_finite() || !(MIN_SETTING..=MAX_SETTING).contains(&value) {
        return Err(PlaybackError::InvalidSetting { name, value });
    }
    Ok(())
}

fn normalize_remote(value: Option<f32>) -> f32 {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => v.clamp(MIN_SETTING, MAX_SETTING),
        _ => DEFAULT_SETTING,
    }
}
