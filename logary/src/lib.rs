#![warn(missing_docs, unreachable_pub)]

//! Application-level structured logging and tracing.
//!
//! `logary` is the facade applications depend on directly. It re-exports
//! the stable data model from `logary-core` and the actor runtime from
//! `logary-subscriber`, and adds:
//!
//! * [`LogManager`] — the thin, mostly-synchronous-looking view over a
//!   running [`logary_subscriber::RegistryHandle`] that application code
//!   actually holds.
//! * [`global`] — process-wide logger resolution, for code that can't
//!   thread a `LogManager` through every call site.
//! * Declarative macros ([`trace!`], [`debug!`], [`info!`], [`warn!`],
//!   [`error!`], [`fatal!`], and their `_ack` siblings, plus [`span!`]) for
//!   emitting messages without hand-building a [`MessageFactory`] closure.

mod macros;
mod manager;

pub mod global;

pub use logary_core::{
    Ack, Clock, CommitAck, FlushInfo, HealthCheckConf, LogLevel, Logger, LogaryError, Message,
    MessageFactory, MetricConf, PointName, RuntimeInfo, ServiceKind, ShutdownInfo, Span,
    SpanIdGenerator, SpanInfo, SystemClock, TargetConf, TargetFactory, TargetSink, Value,
};
pub use logary_subscriber::{
    EngineHandle, GlobalsHandle, LogaryConf, Middleware, PromisedLogger, RegistryHandle,
    SupervisedService,
};
pub use manager::LogManager;
