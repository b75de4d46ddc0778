//! Voice Context - Voice & Catalog

use serde::{Deserialize, Serialize};

use super::VoiceName;

/// 朗读引擎提供的音色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    name: VoiceName,
    lang: String,
    is_default: bool,
}

impl Voice {
    pub fn new(name: VoiceName, lang: impl Into<String>) -> Self {
        Self {
            name,
            lang: lang.into(),
            is_default: false,
        }
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn name(&self) -> &VoiceName {
        &self.name
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }
}

/// 音色目录
///
/// 由平台异步加载，可能分多批到达；同名音色以后到的为准
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceCatalog {
    voices: Vec<Voice>,
}

impl VoiceCatalog {
    pub fn new(voices: Vec<Voice>) -> Self {
        let mut catalog = Self::default();
        catalog.merge(voices);
        catalog
    }

    /// 合并一批音色
    pub fn merge(&mut self, batch: Vec<Voice>) {
        for voice in batch {
            match self.voices.iter_mut().find(|v| v.name == voice.name) {
                Some(existing) => *existing = voice,
                None => self.voices.push(voice),
            }
        }
    }

    pub fn find(&self, name: &str) -> Option<&Voice> {
        self.voices.iter().find(|v| v.name.as_str() == name)
    }

    pub fn contains(&self, name: &VoiceName) -> bool {
        self.voices.iter().any(|v| &v.name == name)
    }

    /// 默认音色：第一个标记为默认的，否则第一个
    pub fn default_voice(&self) -> Option<&Voice> {
        self.voices
            .iter()
            .find(|v| v.is_default)
            .or_else(|| self.voices.first())
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}
