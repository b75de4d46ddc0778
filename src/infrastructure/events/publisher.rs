//! Event Publisher Implementation
//!
//! 播放器事件广播（终端界面等订阅方）

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::domain::{PlaybackSnapshot, Voice};

/// 播放器事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum PlayerEvent {
    /// 播放状态变更
    StateChanged(PlaybackSnapshot),
    /// 用户可见错误
    Error { message: String },
    /// 音色目录
    Voices { voices: Vec<Voice> },
    /// 当前位置附近的文本窗口
    Preview {
        before: String,
        current: String,
        after: String,
    },
    /// 播放循环已退出
    Shutdown,
}

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<PlayerEvent>,
}

impl EventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (channel, _) = broadcast::channel(capacity.max(1));
        Self { channel }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.channel.subscribe()
    }

    pub fn publish_state(&self, snapshot: PlaybackSnapshot) {
        self.publish(PlayerEvent::StateChanged(snapshot));
    }

    pub fn publish_error(&self, message: impl Into<String>) {
        self.publish(PlayerEvent::Error {
            message: message.into(),
        });
    }

    pub fn publish_voices(&self, voices: &[Voice]) {
        self.publish(PlayerEvent::Voices {
            voices: voices.to_vec(),
        });
    }

    pub fn publish_preview(&self, (before, current, after): (&str, &str, &str)) {
        self.publish(PlayerEvent::Preview {
            before: before.to_string(),
            current: current.to_string(),
            after: after.to_string(),
        });
    }

    pub fn publish_shutdown(&self) {
        self.publish(PlayerEvent::Shutdown);
    }

    fn publish(&self, event: PlayerEvent) {
        if let Err(e) = self.channel.send(event) {
            tracing::debug!(error = %e, "Failed to publish event (no receivers)");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribers_receive_events() {
        let publisher = EventPublisher::default();
        let mut rx = publisher.subscribe();

        publisher.publish_error("Please upload a PDF file");
        publisher.publish_preview(("Hello ", "world", ""));

        assert_eq!(
            rx.try_recv().unwrap(),
            PlayerEvent::Error {
                message: "Please upload a PDF file".to_string()
            }
        );
        assert!(matches!(
            rx.try_recv().unwrap(),
            PlayerEvent::Preview { current, .. } if current == "world"
        ));
    }

    #[test]
    fn test_publish_without_subscribers_is_silent() {
        let publisher = EventPublisher::default();
        publisher.publish_shutdown();
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let json = serde_json::to_value(PlayerEvent::Error {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json["event"], "Error");
        assert_eq!(json["data"]["message"], "boom");
    }
}
