//! Storage backends for memnet
//!
//! Everything persisted goes through the `NetworkStore` trait. `JsonFileStore`
//! is the on-disk implementation; `InMemoryStore` backs tests.

mod json;
mod memory;
mod traits;

pub use json::JsonFileStore;
pub use memory::InMemoryStore;
pub use traits::{GraphRecord, NetworkStore, OpenStore, StorageError, StorageResult};
