//! Database layer
//!
//! [`DocumentStore`] is the only way components reach persisted data. It is
//! backed by MongoDB in production and by [`MemoryStore`] in dev mode and tests.

pub mod memory;
pub mod mongo;
pub mod schemas;
pub mod store;

pub use memory::MemoryStore;
pub use mongo::{IntoIndexes, MongoClient};
pub use store::{DocumentStore, FindSpec};
