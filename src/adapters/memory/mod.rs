//! Process-memory record store.

pub mod task_store;

pub use task_store::InMemoryTaskStore;
