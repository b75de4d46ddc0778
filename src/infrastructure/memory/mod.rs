//! In-Memory Adapters
//!
//! 会话服务与本地标识存储的内存实现（离线运行与测试）

mod identifier_store;
mod session_store;

pub use identifier_store::InMemoryIdentifierStore;
pub use session_store::InMemorySessionStore;
