use std::collections::BTreeMap;

use crate::{clock::Timestamp, level::LogLevel, point_name::PointName, value::Value};

/// A single log event.
///
/// Immutable once constructed: `timestamp` is fixed at creation and never
/// mutated, and `context` is updated functionally — [`Message::with_context`]
/// returns a new `Message` rather than mutating in place.
#[derive(Debug, Clone)]
pub struct Message {
    name: PointName,
    level: LogLevel,
    value: Value,
    context: BTreeMap<String, Value>,
    timestamp: Timestamp,
}

/// Context key the [`crate::Logger`] pipeline uses to decide which target a
/// message is routed to. See §6 ("Internal wire conventions").
pub const CONTEXT_TARGET_KEY: &str = "target";
/// Context key a finished [`crate::Span`] attaches its [`crate::SpanInfo`]
/// under.
pub const CONTEXT_SPAN_INFO_KEY: &str = "spanInfo";
/// Context key a finished [`crate::Span`] attaches its id under.
pub const CONTEXT_SPAN_ID_KEY: &str = "spanId";

impl Message {
    /// Constructs a message with an explicit timestamp.
    pub fn new(name: PointName, level: LogLevel, value: Value, timestamp: Timestamp) -> Self {
        Message {
            name,
            level,
            value,
            context: BTreeMap::new(),
            timestamp,
        }
    }

    /// Constructs a message timestamped with [`Timestamp::now`].
    ///
    /// Convenience used by call sites that don't carry an injected
    /// [`crate::Clock`] (most `messageFactory` closures); components that do
    /// have one (the registry, spans) should prefer [`Message::new`] with an
    /// explicit timestamp so tests stay deterministic.
    pub fn event(name: PointName, level: LogLevel, value: Value) -> Self {
        Message::new(name, level, value, Timestamp::now())
    }

    /// The message's origin name.
    pub fn name(&self) -> &PointName {
        &self.name
    }

    /// The message's level.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// The message's payload.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The message's context map.
    pub fn context(&self) -> &BTreeMap<String, Value> {
        &self.context
    }

    /// The message's timestamp.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Returns a new `Message` with `key` bound to `value` in its context.
    /// Shadows any prior binding for the same key.
    pub fn with_context(&self, key: impl Into<String>, value: impl Into<Value>) -> Message {
        let mut context = self.context.clone();
        context.insert(key.into(), value.into());
        Message {
            context,
            ..self.clone()
        }
    }

    /// Returns a new `Message` with `name` replaced.
    pub fn with_name(&self, name: PointName) -> Message {
        Message {
            name,
            ..self.clone()
        }
    }

    /// Convenience for binding [`CONTEXT_TARGET_KEY`].
    pub fn with_target(&self, target: impl Into<String>) -> Message {
        self.with_context(CONTEXT_TARGET_KEY, Value::String(target.into()))
    }

    /// The routing target this message carries, if any (§4.2: "reads
    /// context key `target`. If present and bound to a `String` value...").
    pub fn target(&self) -> Option<&str> {
        match self.context.get(CONTEXT_TARGET_KEY) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}
