use std::time::Duration;

use async_trait::async_trait;

use crate::error::LogaryError;

/// Lifecycle states a supervised [`Service`] moves through. See §4.6.
///
/// Transitions: `Starting -> Running`; `Running <-> Paused`; any state may
/// move to `Faulted` on error; `Running | Paused | Faulted -> Stopped` via
/// shutdown. `Stopped` is terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceState {
    /// The service's task has been spawned but has not yet reported ready.
    Starting,
    /// The service is accepting work.
    Running,
    /// The service is alive but not currently accepting work.
    Paused,
    /// The service's task terminated abnormally; the message carries the
    /// fault's `Display` rendering.
    Faulted(String),
    /// The service has shut down. Terminal.
    Stopped,
}

impl ServiceState {
    /// True for `Faulted(_)`.
    pub fn is_faulted(&self) -> bool {
        matches!(self, ServiceState::Faulted(_))
    }

    /// True for `Stopped`.
    pub fn is_stopped(&self) -> bool {
        matches!(self, ServiceState::Stopped)
    }
}

/// A supervised long-running task with an observable lifecycle and
/// pause/resume/shutdown control. Every target, metric, and health check is
/// wrapped in one of these by the registry (§4.4, §4.6); this trait is the
/// client-facing handle, not the task itself.
#[async_trait]
pub trait Service: Send + Sync {
    /// The name this service was registered under.
    fn name(&self) -> &str;

    /// The service's current lifecycle state.
    async fn state(&self) -> ServiceState;

    /// Requests the service stop accepting work, without tearing it down.
    async fn pause(&self) -> Result<(), LogaryError>;

    /// Requests the service resume accepting work after a pause.
    async fn resume(&self) -> Result<(), LogaryError>;

    /// Requests the service tear down. Waits up to `timeout` (if given) for
    /// the service to acknowledge; on timeout, returns `Err(Timeout)` but
    /// does not otherwise change the shutdown-in-progress outcome — the
    /// caller is expected to consult `state()` afterwards.
    async fn shutdown(&self, timeout: Option<Duration>) -> Result<(), LogaryError>;
}
