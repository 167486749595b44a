/// Errors surfaced by the core pipeline. See §7 ("Error Handling Design").
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum LogaryError {
    /// An invalid `LogaryConf` was supplied at `create` time, e.g. two
    /// targets registered under the same name.
    #[error("invalid logary configuration: {0}")]
    Configuration(String),

    /// A flush or shutdown deadline elapsed before all parties acked.
    ///
    /// Note this is *not* how per-target timeouts are reported — those go
    /// into [`crate::FlushInfo::timeouts`] / [`crate::ShutdownInfo::timeouts`]
    /// as named entries rather than being raised. This variant is for
    /// operations with no partial-result shape to fall back to.
    #[error("operation timed out")]
    Timeout,

    /// The registry (or the engine backing it) has already shut down.
    #[error("registry is stopped")]
    Stopped,

    /// A bounded ingress was configured and is currently saturated.
    /// Non-fatal: callers treat this as a drop signal, not an error to
    /// propagate.
    #[error("ingress buffer is full")]
    BackpressureDrop,

    /// A service's task terminated abnormally.
    #[error("service fault: {0}")]
    ServiceFault(String),
}
