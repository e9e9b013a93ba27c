//! Domain models.

pub mod config;
pub mod task;

pub use config::{CacheConfig, Config, DatabaseConfig, LoggingConfig, ServerConfig};
pub use task::{FieldUpdate, NewTask, Task, TaskPatch, TaskQuery};
