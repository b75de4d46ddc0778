//! Playback Context - 播放限界上下文
//!
//! 职责:
//! - 权威朗读位置与播放状态机
//! - 语速 / 音调参数

mod errors;
mod state;
mod value_objects;

pub use errors::PlaybackError;
pub use state::{PlaybackSnapshot, PlaybackState, PlaybackStatus};
pub use value_objects::{SpeechSettings, DEFAULT_SETTING, MAX_SETTING, MIN_SETTING};
