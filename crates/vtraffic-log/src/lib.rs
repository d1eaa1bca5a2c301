//! Logging sink injected into the pool, the kinematic model and the link
//! plumbing.
//!
//! Components hold an `Arc<dyn Logger>` and log through the `log_*!` macros.
//! `NoOpLogger` is the default, `TracingLogger` forwards to `tracing`, and
//! `MemoryLogger` keeps records for assertions.

mod memory;
mod noop;
mod sink;
mod tracing_adapter;

use std::sync::Arc;

pub use memory::{LogRecord, MemoryLogger};
pub use noop::NoOpLogger;
pub use sink::{LogLevel, Logger};
pub use tracing_adapter::TracingLogger;

/// Shared handle passed to every component that logs.
pub type SharedLogger = Arc<dyn Logger>;

#[must_use]
pub fn noop() -> SharedLogger {
    Arc::new(NoOpLogger)
}
