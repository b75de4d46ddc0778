//! Narration Adapter - 朗读引擎实现

mod paced_engine;

pub use paced_engine::{PacedEngineConfig, PacedNarrationEngine};
