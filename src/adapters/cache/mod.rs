//! In-memory caching layer for task reads.
//!
//! Holds a disposable mirror of the record store. Writes reach it only
//! through `TaskService`, after the store has confirmed them.

pub mod task_cache;

pub use task_cache::TaskCache;
