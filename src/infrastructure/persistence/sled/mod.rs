//! Sled Storage

mod identifier_store;

pub use identifier_store::{SledIdentifierStore, SledStoreConfig};
