#![deny(missing_debug_implementations)]
#![warn(missing_docs, unreachable_pub)]

//! Core primitives for `logary`.
//!
//! `logary` is a structured logging and tracing library built around a
//! single in-process message pipeline: application code calls into a
//! [`Logger`], the message travels through a user-supplied processing
//! pipeline, and is fanned out to named targets. This crate defines the
//! stable, slow-moving core of that pipeline:
//!
//! * [`Message`], [`PointName`], [`LogLevel`] and [`Value`] — the data
//!   carried by every log event.
//! * [`Logger`] — the capability application code holds to emit messages.
//! * [`Span`] and [`SpanIdGenerator`] — the scoped tracing primitive and its
//!   hierarchical identifier allocator.
//! * [`Service`] and [`ServiceState`] — the supervised-lifecycle shape every
//!   target, metric, and health check is wrapped in.
//! * [`TargetSink`] and the `*Conf` factory types — the interface concrete
//!   target implementations (not provided by this crate) must satisfy.
//!
//! Application authors will typically not depend on this crate directly;
//! instead they use the `logary` facade crate, which layers an actor runtime
//! and ergonomic macros on top of these primitives.

mod clock;
mod conf;
mod error;
mod flush;
mod level;
mod logger;
mod message;
mod point_name;
mod service;
mod span;
mod value;

pub use crate::{
    clock::{Clock, SystemClock, Timestamp, TICKS_PER_SECOND},
    conf::{HealthCheckConf, MetricConf, ServiceKind, TargetConf, TargetFactory, TargetSink},
    error::LogaryError,
    flush::{FlushInfo, ShutdownInfo},
    level::LogLevel,
    logger::{Ack, CommitAck, Logger, MessageFactory},
    message::Message,
    point_name::PointName,
    service::{Service, ServiceState},
    span::{Span, SpanIdGenerator, SpanInfo},
    value::Value,
};

/// Immutable description of the process a [`crate::Logger`] is running in.
///
/// Constructed once at registry creation and handed, read-only, to every
/// spawned target/metric/health-check factory. See §3 ("RuntimeInfo") of the
/// design: immutable after registry creation.
#[derive(Clone)]
pub struct RuntimeInfo {
    /// Logical service name, e.g. `"orders-api"`.
    pub service: String,
    /// Host name the process is running on.
    pub host: String,
    /// Clock used for timestamping messages and spans.
    pub clock: std::sync::Arc<dyn Clock>,
    /// The library's own internal logger, for logging about itself.
    pub logger: std::sync::Arc<dyn Logger>,
}

impl RuntimeInfo {
    /// Builds a `RuntimeInfo`. Registry composition typically constructs a
    /// placeholder here and later swaps in the real internal logger via
    /// [`RuntimeInfo::with_logger`] once that logger exists.
    pub fn new(
        service: impl Into<String>,
        host: impl Into<String>,
        clock: std::sync::Arc<dyn Clock>,
        logger: std::sync::Arc<dyn Logger>,
    ) -> Self {
        RuntimeInfo {
            service: service.into(),
            host: host.into(),
            clock,
            logger,
        }
    }

    /// Returns a copy of this `RuntimeInfo` with `logger` substituted.
    pub fn with_logger(&self, logger: std::sync::Arc<dyn Logger>) -> Self {
        RuntimeInfo {
            logger,
            ..self.clone()
        }
    }
}

impl std::fmt::Debug for RuntimeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeInfo")
            .field("service", &self.service)
            .field("host", &self.host)
            .finish()
    }
}
