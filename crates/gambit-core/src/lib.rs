//! Core abstractions for the Gambit lead service.
//!
//! This crate provides the types shared by every other crate:
//! - `GambitConfig` - Service configuration and discovery
//! - `RequestId` - Per-request identifier for log correlation
//! - `ConfigError` - Configuration loading failures

mod config;
mod context;
mod error;

pub use config::*;
pub use context::*;
pub use error::*;
