//! taskcache - task records behind a write-through in-process cache
//!
//! A CRUD service for task records stored in SQLite. Reads are served from
//! an in-memory mirror of the table whenever it can answer them; writes go to
//! the store first and are mirrored into the cache only once committed.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): task models, errors and the record store port
//! - **Adapters** (`adapters`): SQLite and in-memory stores, the cache, HTTP
//! - **Service Layer** (`services`): preload, write-through coordination, read routing
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use taskcache::{InMemoryTaskStore, NewTask, TaskCache, TaskService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = TaskService::new(Arc::new(InMemoryTaskStore::new()), Arc::new(TaskCache::new()));
//!     let task = service.create(NewTask::new("title", "", chrono::Utc::now())).await?;
//!     assert_eq!(service.find_by_id(task.id).await?, task);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::cache::TaskCache;
pub use adapters::memory::InMemoryTaskStore;
pub use adapters::sqlite::SqliteTaskStore;
pub use domain::models::{Config, NewTask, Task, TaskPatch, TaskQuery};
pub use domain::ports::TaskStore;
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{PreloadReport, Preloader, TaskService};
