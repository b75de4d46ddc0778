//! Narration Engine Port - 朗读引擎抽象
//!
//! 定义语音合成的抽象接口，具体实现在 infrastructure/adapters 层
//!
//! 引擎通过事件通道回报进度，每个事件携带其所属的 UtteranceId，
//! 消费方必须丢弃非当前 utterance 的事件

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{SpeechSettings, Voice, VoiceName};

/// 朗读引擎错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NarrationError {
    #[error("Utterance {0} is not active")]
    StaleUtterance(UtteranceId),

    /// cancel() 的确认，不应展示给用户
    #[error("Utterance interrupted")]
    Interrupted,

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Narration engine unavailable: {0}")]
    Unavailable(String),
}

/// 单次朗读的句柄标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(u64);

impl UtteranceId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "utt-{}", self.0)
    }
}

/// 朗读请求
#[derive(Debug, Clone)]
pub struct UtteranceRequest {
    /// 要朗读的文本切片
    pub text: String,
    pub settings: SpeechSettings,
    /// 为 None 时由引擎使用其默认音色
    pub voice: Option<VoiceName>,
}

/// 引擎事件
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationEvent {
    /// 词边界进度，char_index 相对于请求文本切片，单个 utterance 内严格递增
    Progress {
        utterance: UtteranceId,
        char_index: usize,
    },
    /// 终止事件：朗读完成
    Completed { utterance: UtteranceId },
    /// 终止事件：朗读出错（被取消时为 Interrupted）
    Errored {
        utterance: UtteranceId,
        error: NarrationError,
    },
    /// 音色目录变更（完整目录）
    VoicesChanged(Vec<Voice>),
}

impl NarrationEvent {
    /// 事件所属的 utterance，目录事件为 None
    pub fn utterance(&self) -> Option<UtteranceId> {
        match self {
            NarrationEvent::Progress { utterance, .. }
            | NarrationEvent::Completed { utterance }
            | NarrationEvent::Errored { utterance, .. } => Some(*utterance),
            NarrationEvent::VoicesChanged(_) => None,
        }
    }
}

/// Narration Engine Port
///
/// 同一时刻最多存在一个活动 utterance
#[async_trait]
pub trait NarrationEnginePort: Send + Sync {
    /// 开始朗读
    ///
    /// 总是先取消已有 utterance。返回的句柄之后恰好产生一个终止事件，
    /// 以及零或多个严格递增的进度事件
    async fn start(&self, request: UtteranceRequest) -> Result<UtteranceId, NarrationError>;

    /// 暂停，仅对当前活动句柄有效
    async fn pause(&self, utterance: UtteranceId) -> Result<(), NarrationError>;

    /// 恢复，仅对当前活动句柄有效
    async fn resume(&self, utterance: UtteranceId) -> Result<(), NarrationError>;

    /// 取消当前 utterance（幂等）
    ///
    /// 返回后不会再有任何旧句柄的事件产生
    async fn cancel(&self);

    /// 当前音色目录
    async fn voices(&self) -> Vec<Voice>;
}
