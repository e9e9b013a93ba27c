//! Domain layer: task records, configuration models, errors and the
//! record store port.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
