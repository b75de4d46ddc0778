//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod identifier_store;
mod narration_engine;
mod session_store;

pub use identifier_store::{IdentifierStoreError, IdentifierStorePort, ACTIVE_SESSION_KEY};
pub use narration_engine::{
    NarrationEnginePort, NarrationError, NarrationEvent, UtteranceId, UtteranceRequest,
};
pub use session_store::{
    PdfUpload, SessionStoreError, SessionStorePort, UploadedDocument,
};
