//! Player Commands - 用户传输操作
//!
//! 由界面发送到 PlayerLoop，在单一逻辑线程上依次执行

use super::UploadDocument;

/// 用户命令
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Upload(UploadDocument),
    /// 播放 / 暂停切换
    Play,
    Pause,
    Resume,
    Stop,
    Seek(usize),
    ChangeRate(f32),
    ChangePitch(f32),
    ChangeVoice(String),
    /// 请求发布音色目录
    ListVoices,
    /// 请求发布当前快照与预览
    Status,
    Shutdown,
}

impl PlayerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerCommand::Upload(_) => "upload",
            PlayerCommand::Play => "play",
            PlayerCommand::Pause => "pause",
            PlayerCommand::Resume => "resume",
            PlayerCommand::Stop => "stop",
            PlayerCommand::Seek(_) => "seek",
            PlayerCommand::ChangeRate(_) => "rate",
            PlayerCommand::ChangePitch(_) => "pitch",
            PlayerCommand::ChangeVoice(_) => "voice",
            PlayerCommand::ListVoices => "voices",
            PlayerCommand::Status => "status",
            PlayerCommand::Shutdown => "shutdown",
        }
    }
}
