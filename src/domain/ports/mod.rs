//! Port trait definitions (Hexagonal Architecture).
//!
//! - `TaskStore`: the durable record store the cache mirrors

pub mod task_store;

pub use task_store::TaskStore;
