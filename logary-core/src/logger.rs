use std::fmt;

use async_trait::async_trait;

use crate::{error::LogaryError, level::LogLevel, message::Message, point_name::PointName};

/// Builds the [`Message`] to be logged, given the admitted level.
///
/// Lazy by construction: per §4.1, a `MessageFactory` must be invoked at
/// most once, and only if the message is actually admitted (`level >=
/// logger.level()`). Boxed rather than generic so `Logger` stays
/// object-safe — every caller in this codebase treats loggers as trait
/// objects (`Arc<dyn Logger>`).
pub type MessageFactory = Box<dyn FnOnce(LogLevel) -> Message + Send>;

/// Acknowledges that a message was *accepted onto the ingress*, not that any
/// target has written it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack;

/// Result of a non-blocking [`Logger::log`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitAck {
    /// The message was handed to the ingress.
    Committed,
    /// The ingress is bounded and currently saturated; the message was
    /// dropped. Not an error — see §7, `BackpressureDrop`.
    BufferFull,
}

/// The capability application code holds to emit log events.
///
/// A `Logger` is cheap to clone (implementations are typically a thin
/// wrapper around a channel handle) and safe to share across tasks and
/// threads.
#[async_trait]
pub trait Logger: Send + Sync + fmt::Debug {
    /// The name this logger was obtained under.
    fn name(&self) -> &PointName;

    /// The minimum level this logger admits. Messages below this level are
    /// dropped without invoking their factory.
    fn level(&self) -> LogLevel;

    /// Enqueues a message without waiting for engine acknowledgement.
    ///
    /// `factory` is invoked exactly once, synchronously, iff `level >=
    /// self.level()`.
    fn log(&self, level: LogLevel, factory: MessageFactory) -> Result<CommitAck, LogaryError>;

    /// Enqueues a message and returns a future that resolves once the
    /// message has passed through the engine's processing pipeline (not
    /// once targets have written it).
    async fn log_with_ack(
        &self,
        level: LogLevel,
        factory: MessageFactory,
    ) -> Result<Ack, LogaryError>;
}
