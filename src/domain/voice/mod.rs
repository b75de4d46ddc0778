//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 朗读引擎音色目录
//! - 默认音色选择

mod aggregate;
mod value_objects;

pub use aggregate::{Voice, VoiceCatalog};
pub use value_objects::VoiceName;
