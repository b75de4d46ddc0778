//! Document Context - Value Objects

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Document;
use crate::domain::playback::SpeechSettings;

/// 会话唯一标识（由远端会话服务分配，不透明）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Result<Self, &'static str> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("会话标识不能为空");
        }
        Ok(Self(id))
    }

    /// 生成新的随机标识
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 远端会话投影 `{ text, position, rate, pitch }`
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub document: Document,
    pub position: usize,
    pub settings: SpeechSettings,
}

impl SessionSnapshot {
    pub fn new(
        session_id: SessionId,
        document: Document,
        position: usize,
        settings: SpeechSettings,
    ) -> Self {
        let position = document.clamp(position);
        Self {
            session_id,
            document,
            position,
            settings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_rejects_blank() {
        assert!(SessionId::new("").is_err());
        assert!(SessionId::new("   ").is_err());
        assert_eq!(SessionId::new("abc").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_snapshot_clamps_position() {
        let snapshot = SessionSnapshot::new(
            SessionId::new("s1").unwrap(),
            Document::new("Hello"),
            99,
            SpeechSettings::default(),
        );
        assert_eq!(snapshot.position, 5);
    }
}
