//! Infrastructure layer module
//!
//! Process-wide concerns that sit outside the domain:
//! - Configuration management
//! - Logging infrastructure

pub mod config;
pub mod logging;
