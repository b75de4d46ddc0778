//! Domain Layer - 领域层
//!
//! 包含三个限界上下文:
//! - Document Context: 文档与远端会话投影
//! - Playback Context: 播放状态机与朗读参数
//! - Voice Context: 音色目录

pub mod document;
pub mod playback;
pub mod voice;

// 共享的词边界切分
mod text_segmenter;

pub use document::{Document, SessionId, SessionSnapshot};
pub use playback::{PlaybackError, PlaybackSnapshot, PlaybackState, PlaybackStatus, SpeechSettings};
pub use text_segmenter::{word_boundaries, WordBoundary};
pub use voice::{Voice, VoiceCatalog, VoiceName};
