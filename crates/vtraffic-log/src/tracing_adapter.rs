use std::fmt::Arguments;

use crate::{LogLevel, Logger};

/// Forwards messages to the `tracing` subscriber installed by the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, args: Arguments<'_>) {
        match level {
            LogLevel::Trace => tracing::trace!(target: "vtraffic", "{}", args),
            LogLevel::Debug => tracing::debug!(target: "vtraffic", "{}", args),
            LogLevel::Info => tracing::info!(target: "vtraffic", "{}", args),
            LogLevel::Warn => tracing::warn!(target: "vtraffic", "{}", args),
            LogLevel::Error => tracing::error!(target: "vtraffic", "{}", args),
        }
    }
}
