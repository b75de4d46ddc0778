//! Session Adapter - 远端会话服务客户端

mod http_session_store;

pub use http_session_store::{HttpSessionStore, HttpSessionStoreConfig};
