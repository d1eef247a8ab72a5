//! Observability infrastructure for the Gambit lead service.
//!
//! This crate provides:
//! - `StructuredLogger` - Request-scoped structured logging over `tracing`
//! - `LogEvent` - Pending event with typed fields
//! - `init_tracing` - Subscriber setup from `LoggingConfig`

mod logging;
mod subscriber;

pub use logging::*;
pub use subscriber::*;

// Re-export from gambit-core for convenience
pub use gambit_core::{LogFormat, LoggingConfig, RequestId};
