//! The builder applications assemble before calling
//! [`crate::registry::Registry::create`] (SPEC_FULL.md §10.3).

use std::sync::Arc;

use logary_core::{HealthCheckConf, LogLevel, MetricConf, RuntimeInfo, TargetConf};

use crate::engine::{ProcessingFn, DEFAULT_INGRESS_CAPACITY};
use crate::middleware::Middleware;

/// `{targets, metrics, healthChecks, runtimeInfo, middleware[], processing}`
/// (§6). Consumed once, by `Registry::create`.
pub struct LogaryConf {
    pub(crate) runtime_info: RuntimeInfo,
    pub(crate) targets: Vec<TargetConf>,
    pub(crate) metrics: Vec<MetricConf>,
    pub(crate) health_checks: Vec<HealthCheckConf>,
    pub(crate) middleware: Vec<Middleware>,
    pub(crate) processing: ProcessingFn,
    pub(crate) ingress_capacity: usize,
    pub(crate) default_level: LogLevel,
}

/// The default processing function: forward every message unchanged. The
/// routing decision still happens downstream, in the engine, by reading the
/// `"target"` context key (§4.2).
fn pass_through() -> ProcessingFn {
    Arc::new(|message, emit| {
        Box::pin(async move {
            emit.emit(message);
        })
    })
}

impl LogaryConf {
    /// Starts a configuration rooted at `runtime_info`. The `logger` field
    /// of `runtime_info` is typically a placeholder here — the registry
    /// replaces it with its own internal logger at `create` time (§4.4 step
    /// 1) and hands the final `RuntimeInfo` to every target/metric/health
    /// check factory.
    pub fn new(runtime_info: RuntimeInfo) -> Self {
        LogaryConf {
            runtime_info,
            targets: Vec::new(),
            metrics: Vec::new(),
            health_checks: Vec::new(),
            middleware: Vec::new(),
            processing: pass_through(),
            ingress_capacity: DEFAULT_INGRESS_CAPACITY,
            default_level: LogLevel::Verbose,
        }
    }

    /// Registers a target to be spawned and subscribed by name.
    pub fn with_target(mut self, conf: TargetConf) -> Self {
        self.targets.push(conf);
        self
    }

    /// Registers a metric sink (structurally identical to a target).
    pub fn with_metric(mut self, conf: MetricConf) -> Self {
        self.metrics.push(conf);
        self
    }

    /// Registers a health check (supervised, never an engine subscriber).
    pub fn with_health_check(mut self, conf: HealthCheckConf) -> Self {
        self.health_checks.push(conf);
        self
    }

    /// Appends a registry-level middleware stage, run before any call-site
    /// middleware (§4.4 "getLogger").
    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Overrides the engine's processing function. Default is
    /// pass-through (rely entirely on the `"target"` context key).
    pub fn with_processing(mut self, processing: ProcessingFn) -> Self {
        self.processing = processing;
        self
    }

    /// Overrides the engine's ingress channel capacity (default
    /// [`DEFAULT_INGRESS_CAPACITY`]).
    pub fn with_ingress_capacity(mut self, capacity: usize) -> Self {
        self.ingress_capacity = capacity;
        self
    }

    /// Overrides the minimum level loggers handed out by this registry
    /// admit (default `Verbose`). The logger-name hierarchy filter rules
    /// mentioned in §1 ("assumed to exist") are out of scope for this
    /// crate; every logger obtained from a given registry shares this one
    /// configured level.
    pub fn with_default_level(mut self, level: LogLevel) -> Self {
        self.default_level = level;
        self
    }
}
