//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（NarrationEngine、SessionStore、IdentifierStore）
//! - commands: 上传命令与播放命令
//! - controller: 播放控制器（权威位置与状态机）
//! - mirror: 会话镜像（远端同步与恢复）
//! - error: 应用层错误定义

pub mod commands;
pub mod controller;
pub mod error;
pub mod mirror;
pub mod ports;

// Re-exports
pub use commands::{handlers::UploadDocumentHandler, PlayerCommand, UploadDocument};
pub use controller::{PlaybackConfig, PlaybackController};
pub use error::ApplicationError;
pub use mirror::SessionMirror;
pub use ports::{
    // Identifier store
    IdentifierStoreError,
    IdentifierStorePort,
    // Narration engine
    NarrationEnginePort,
    NarrationError,
    NarrationEvent,
    UtteranceId,
    UtteranceRequest,
    // Session store
    PdfUpload,
    SessionStoreError,
    SessionStorePort,
    UploadedDocument,
};
