/// Outcome of a [`crate::Logger`]-facing flush request: which targets acked
/// in time, and which did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushInfo {
    /// Names of targets that acked before the deadline (or before the
    /// flush completed, if no deadline was given).
    pub acks: Vec<String>,
    /// Names of targets that had not acked by the deadline.
    pub timeouts: Vec<String>,
}

/// Outcome of a shutdown request, with the same `{acks, timeouts}` shape as
/// [`FlushInfo`] but covering every supervised service, not just targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownInfo {
    /// Names of services that acked shutdown before the deadline.
    pub acks: Vec<String>,
    /// Names of services that had not acked shutdown by the deadline.
    pub timeouts: Vec<String>,
}
