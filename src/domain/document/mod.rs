//! Document Context - 文档限界上下文
//!
//! 职责:
//! - 当前会话的不可变文本
//! - 字符偏移与文本切片
//! - 远端会话投影

mod aggregate;
mod value_objects;

pub use aggregate::{Document, PREVIEW_WINDOW_CHARS};
pub use value_objects::{SessionId, SessionSnapshot};
