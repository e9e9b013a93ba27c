//! Service layer: cache preload, write-through coordination and
//! cache-first reads.

pub mod preloader;
pub mod task_service;
pub mod write_gate;

pub use preloader::{PreloadReport, Preloader};
pub use task_service::TaskService;
pub use write_gate::WriteGate;
