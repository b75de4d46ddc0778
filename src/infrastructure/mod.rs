//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现，以及驱动控制器的播放循环

pub mod adapters;
pub mod events;
pub mod memory;
pub mod persistence;
pub mod console;
pub mod runtime;

pub use adapters::{HttpSessionStore, HttpSessionStoreConfig, PacedEngineConfig, PacedNarrationEngine};
pub use events::{EventPublisher, PlayerEvent};
pub use memory::{InMemoryIdentifierStore, InMemorySessionStore};
pub use persistence::sled::{SledIdentifierStore, SledStoreConfig};
pub use runtime::PlayerLoop;
