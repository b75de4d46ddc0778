//! PDF Aloud - PDF 朗读播放位置同步核心
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Document Context: 文档与远端会话投影
//! - Playback Context: 播放状态机与朗读参数
//! - Voice Context: 音色目录
//!
//! 应用层 (application/):
//! - Ports: 端口定义（NarrationEngine, SessionStore, IdentifierStore）
//! - Commands: 上传命令处理器与播放命令
//! - Controller: 权威朗读位置与播放状态
//! - Mirror: 远端会话同步与启动恢复
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: 节拍朗读引擎, HTTP 会话服务客户端
//! - Memory: 会话服务与标识存储的内存实现
//! - Persistence: Sled 本地标识存储
//! - Runtime: PlayerLoop 单一逻辑线程
//! - Events: 播放器事件广播
//! - Console: 终端命令解析

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
