//! Event Publishing

mod publisher;

pub use publisher::{EventPublisher, PlayerEvent};
