//! HTTP surface for the task service.

pub mod tasks_http;

pub use tasks_http::{ErrorResponse, ServerError, TasksHttpServer};
