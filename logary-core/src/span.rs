use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    clock::{Clock, Timestamp},
    error::LogaryError,
    level::LogLevel,
    logger::{Ack, Logger},
    message::{Message, CONTEXT_SPAN_ID_KEY, CONTEXT_SPAN_INFO_KEY},
    point_name::PointName,
    value::Value,
};

/// Allocates hierarchical span identifiers of the form
/// `"#{host}-{service}.{hex}[.{hex}]*"` (§4.3).
///
/// Counter allocation is keyed by *normalized* parent id: `None`, `Some("")`
/// and whitespace-only parents are all treated as the root key `""`. Each
/// distinct key owns an independent, monotonically increasing `u64` counter
/// guarded by an atomic fetch-add, so concurrent `generate` calls for the
/// same parent never observe the same value (§8's uniqueness property).
///
/// The counter wraps on overflow (standard `u64::wrapping_add` semantics of
/// `AtomicU64::fetch_add`); at one allocation per nanosecond that takes over
/// 584 years to reach, so wrapping is documented rather than guarded
/// against.
#[derive(Debug)]
pub struct SpanIdGenerator {
    local_prefix: String,
    counters: DashMap<String, AtomicU64>,
}

fn normalize_parent(parent_id: Option<&str>) -> String {
    parent_id.map(str::trim).unwrap_or("").to_string()
}

impl SpanIdGenerator {
    /// Creates a generator local to the given `host`/`service` pair. Every
    /// id this generator allocates for a root span starts with
    /// `"#{host}-{service}"`.
    pub fn new(host: impl Into<String>, service: impl Into<String>) -> Self {
        SpanIdGenerator {
            local_prefix: format!("#{}-{}", host.into(), service.into()),
            counters: DashMap::new(),
        }
    }

    /// Allocates a new id under the given (possibly absent) parent id.
    ///
    /// If `parent_id` already carries this generator's local prefix, it is
    /// reused verbatim as the base of the new id (the common, same-process
    /// case). Otherwise the local prefix is prepended, which lets ids
    /// propagated in from another process still acquire local structure.
    pub fn generate(&self, parent_id: Option<&str>) -> String {
        let key = normalize_parent(parent_id);
        let base = if key.is_empty() {
            self.local_prefix.clone()
        } else if key.starts_with(&self.local_prefix) {
            key.clone()
        } else {
            format!("{}.{}", self.local_prefix, key)
        };
        let counter = self
            .counters
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0));
        let n = counter.fetch_add(1, Ordering::Relaxed);
        format!("{}.{:x}", base, n)
    }

    /// Drops the counter entry used to allocate children of `id`. Called
    /// once a span with that id finishes, since it can never allocate
    /// another child afterwards.
    pub fn remove(&self, id: &str) {
        self.counters.remove(id);
    }
}

/// Attached to a finished span's completion [`Message`] under the
/// `"spanInfo"` context key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanInfo {
    /// The span's id.
    pub id: String,
    /// When the span began, in ticks.
    pub begin_at: i64,
    /// When the span finished, in ticks.
    pub end_at: i64,
    /// `end_at - begin_at`, in ticks.
    pub duration: i64,
}

impl SpanInfo {
    fn into_value(self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("id".to_string(), Value::String(self.id));
        map.insert("beginAt".to_string(), Value::Int64(self.begin_at));
        map.insert("endAt".to_string(), Value::Int64(self.end_at));
        map.insert("duration".to_string(), Value::Int64(self.duration));
        Value::Object(map)
    }
}

/// A scoped unit of tracing, bounded by a begin instant and an end instant,
/// emitting exactly one completion message on [`Span::finish`] (§4.3).
#[derive(Clone)]
pub struct Span {
    id: String,
    parent_id: Option<String>,
    begin_at: Timestamp,
    logger: Arc<dyn Logger>,
    has_fired: Arc<AtomicBool>,
    child_counter: Arc<AtomicU64>,
    clock: Arc<dyn Clock>,
    id_gen: Arc<SpanIdGenerator>,
}

impl std::fmt::Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Span")
            .field("id", &self.id)
            .field("parent_id", &self.parent_id)
            .field("has_fired", &self.has_fired.load(Ordering::Relaxed))
            .finish()
    }
}

impl Span {
    /// Starts a new span with no parent.
    pub fn root(
        logger: Arc<dyn Logger>,
        clock: Arc<dyn Clock>,
        id_gen: Arc<SpanIdGenerator>,
    ) -> Self {
        Self::start(None, logger, clock, id_gen)
    }

    /// Starts a new span as a child of `parent_id`.
    pub fn child_of(
        parent_id: impl Into<String>,
        logger: Arc<dyn Logger>,
        clock: Arc<dyn Clock>,
        id_gen: Arc<SpanIdGenerator>,
    ) -> Self {
        Self::start(Some(parent_id.into()), logger, clock, id_gen)
    }

    fn start(
        parent_id: Option<String>,
        logger: Arc<dyn Logger>,
        clock: Arc<dyn Clock>,
        id_gen: Arc<SpanIdGenerator>,
    ) -> Self {
        let id = id_gen.generate(parent_id.as_deref());
        Span {
            id,
            parent_id,
            begin_at: clock.now(),
            logger,
            has_fired: Arc::new(AtomicBool::new(false)),
            child_counter: Arc::new(AtomicU64::new(0)),
            clock,
            id_gen,
        }
    }

    /// Starts a span that is a child of `self`.
    pub fn child(&self) -> Span {
        self.child_counter.fetch_add(1, Ordering::Relaxed);
        Span::child_of(
            self.id.clone(),
            self.logger.clone(),
            self.clock.clone(),
            self.id_gen.clone(),
        )
    }

    /// This span's id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// This span's parent id, if any.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// Number of children started from this span so far.
    pub fn child_count(&self) -> u64 {
        self.child_counter.load(Ordering::Relaxed)
    }

    /// Idempotently finishes the span: the first call builds a completion
    /// message at `Info` level, applies `transform` to it, attaches
    /// `spanInfo`/`spanId` context, and logs it with ack. Every subsequent
    /// call is a no-op that returns an already-completed ack (§8).
    pub async fn finish<T>(&self, transform: T) -> Result<Ack, LogaryError>
    where
        T: FnOnce(Message) -> Message + Send + 'static,
    {
        if self.has_fired.swap(true, Ordering::AcqRel) {
            return Ok(Ack);
        }
        self.id_gen.remove(&self.id);

        let end_at = self.clock.now();
        let span_info = SpanInfo {
            id: self.id.clone(),
            begin_at: self.begin_at.ticks(),
            end_at: end_at.ticks(),
            duration: end_at.ticks_since(self.begin_at),
        };
        let span_id = self.id.clone();
        let logger_name: PointName = self.logger.name().clone();
        let base = Message::new(
            logger_name,
            LogLevel::Info,
            Value::string("span finished"),
            end_at,
        )
        .with_context(CONTEXT_SPAN_INFO_KEY, span_info.into_value())
        .with_context(CONTEXT_SPAN_ID_KEY, Value::String(span_id));
        let transformed = transform(base);

        self.logger
            .log_with_ack(LogLevel::Info, Box::new(move |_| transformed))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SystemClock;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct RecordingLogger {
        name: PointName,
        received: Mutex<Vec<Message>>,
    }

    #[async_trait]
    impl Logger for RecordingLogger {
        fn name(&self) -> &PointName {
            &self.name
        }
        fn level(&self) -> LogLevel {
            LogLevel::Verbose
        }
        fn log(
            &self,
            _level: LogLevel,
            _factory: crate::MessageFactory,
        ) -> Result<crate::CommitAck, LogaryError> {
            unimplemented!("spans only use log_with_ack")
        }
        async fn log_with_ack(
            &self,
            level: LogLevel,
            factory: crate::MessageFactory,
        ) -> Result<Ack, LogaryError> {
            self.received.lock().unwrap().push(factory(level));
            Ok(Ack)
        }
    }

    fn logger() -> Arc<RecordingLogger> {
        Arc::new(RecordingLogger {
            name: PointName::new(["test"]),
            received: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn generate_is_unique_per_parent_under_concurrency() {
        let gen = Arc::new(SpanIdGenerator::new("h", "s"));
        let mut handles = Vec::new();
        for _ in 0..64 {
            let gen = gen.clone();
            handles.push(tokio::spawn(async move { gen.generate(Some("p")) }));
        }
        let mut ids = std::collections::HashSet::new();
        for h in handles {
            ids.insert(h.await.unwrap());
        }
        assert_eq!(ids.len(), 64);
    }

    #[test]
    fn root_id_matches_expected_shape() {
        let gen = SpanIdGenerator::new("h", "s");
        let id = gen.generate(None);
        assert!(
            regex_like_root(&id),
            "unexpected root id shape: {id}"
        );
    }

    fn regex_like_root(id: &str) -> bool {
        let Some(rest) = id.strip_prefix("#h-s.") else {
            return false;
        };
        !rest.is_empty() && rest.chars().all(|c| c.is_ascii_hexdigit())
    }

    #[test]
    fn none_empty_and_whitespace_parents_are_equivalent() {
        let gen = SpanIdGenerator::new("h", "s");
        let a = gen.generate(None);
        let b = gen.generate(Some(""));
        let c = gen.generate(Some("   "));
        // All three drew from the same ("") counter, so they're sequential
        // under the same base.
        assert!(a.starts_with("#h-s."));
        assert!(b.starts_with("#h-s."));
        assert!(c.starts_with("#h-s."));
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[tokio::test]
    async fn child_id_extends_parent() {
        let gen = Arc::new(SpanIdGenerator::new("h", "s"));
        let root = Span::root(logger(), Arc::new(SystemClock), gen);
        let child = root.child();
        assert!(child.id().starts_with(root.id()));
        assert_eq!(child.id()[root.id().len()..].matches('.').count(), 1);
    }

    #[tokio::test]
    async fn finish_is_idempotent() {
        let log = logger();
        let gen = Arc::new(SpanIdGenerator::new("h", "s"));
        let span = Span::root(log.clone(), Arc::new(SystemClock), gen);

        span.finish(|m| m).await.unwrap();
        span.finish(|m| m).await.unwrap();

        assert_eq!(log.received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn finish_attaches_span_id_and_nonnegative_duration() {
        let log = logger();
        let gen = Arc::new(SpanIdGenerator::new("h", "s"));
        let span = Span::root(log.clone(), Arc::new(SystemClock), gen);
        let id = span.id().to_string();

        span.finish(|m| m).await.unwrap();

        let received = log.received.lock().unwrap();
        let msg = &received[0];
        assert_eq!(msg.context().get("spanId"), Some(&Value::String(id)));
        match msg.context().get("spanInfo") {
            Some(Value::Object(fields)) => match fields.get("duration") {
                Some(Value::Int64(d)) => assert!(*d >= 0),
                other => panic!("unexpected duration field: {other:?}"),
            },
            other => panic!("unexpected spanInfo field: {other:?}"),
        }
    }
}
