//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：上传文档与播放传输操作

mod document_commands;
mod player_commands;

pub mod handlers;

pub use document_commands::*;
pub use player_commands::*;
