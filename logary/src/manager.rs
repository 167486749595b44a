//! The thin synchronous-looking view over a running registry that
//! application code actually depends on (§6 "External Interfaces").

use std::sync::Arc;
use std::time::Duration;

use logary_core::{FlushInfo, LogaryError, Logger, PointName, RuntimeInfo, ShutdownInfo};
use logary_subscriber::{LogaryConf, PromisedLogger, RegistryHandle};

/// Application-facing handle to a running log pipeline.
///
/// Constructing one spawns the engine, every configured target/metric/health
/// check, and the process-wide globals service (which immediately installs
/// this manager's loggers as the default resolved by [`crate::global::get_logger`]).
/// Cloning is cheap; every clone drives the same underlying registry.
#[derive(Clone)]
pub struct LogManager {
    registry: RegistryHandle,
}

impl LogManager {
    /// Builds and starts every service named in `conf`. Fails with
    /// [`LogaryError::Configuration`] if two entries of the same kind share a
    /// name or a factory errors; nothing is left half-started in that case.
    pub fn create(conf: LogaryConf) -> Result<LogManager, LogaryError> {
        let registry = RegistryHandle::create(conf)?;
        Ok(LogManager { registry })
    }

    /// The process description this manager was created with.
    pub fn runtime_info(&self) -> &RuntimeInfo {
        self.registry.runtime_info()
    }

    /// Resolves `name` to a logger, awaiting the registry actor.
    pub async fn get_logger(&self, name: PointName) -> Result<Arc<dyn Logger>, LogaryError> {
        self.registry.get_logger(name).await
    }

    /// Returns a buffering proxy immediately; it forwards to the real
    /// logger once the registry actor answers, replaying anything buffered
    /// in the meantime (§6, §9 "Promised logger").
    pub fn get_logger_sync(&self, name: PointName) -> Arc<PromisedLogger> {
        self.registry.get_logger_sync(name)
    }

    /// Requests every target flush, waiting up to `timeout` (if given).
    pub async fn flush_pending(&self, timeout: Option<Duration>) -> Result<FlushInfo, LogaryError> {
        self.registry.flush(timeout).await
    }

    /// Flushes, then stops every service in reverse dependency order.
    /// Terminal: subsequent calls on this (or any clone of this) manager
    /// fail with [`LogaryError::Stopped`].
    pub async fn shutdown(
        &self,
        flush_timeout: Option<Duration>,
        shutdown_timeout: Option<Duration>,
    ) -> Result<(FlushInfo, ShutdownInfo), LogaryError> {
        self.registry.shutdown(flush_timeout, shutdown_timeout).await
    }
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("service", &self.runtime_info().service)
            .finish()
    }
}
