//! The `getLoggerSync` proxy (§6, §9 "Promised logger"): a [`Logger`]
//! handed out immediately, before the real logger has resolved, that
//! buffers calls and replays them once `resolve` is called.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use logary_core::{Ack, CommitAck, LogLevel, LogaryError, Logger, MessageFactory, PointName};
use parking_lot::Mutex;
use tokio::sync::oneshot;

struct BufferedEntry {
    level: LogLevel,
    factory: MessageFactory,
    ack: Option<oneshot::Sender<Result<Ack, LogaryError>>>,
}

enum State {
    Buffering {
        buffer: VecDeque<BufferedEntry>,
        capacity: usize,
    },
    Resolved(Arc<dyn Logger>),
}

/// A logger returned before its backing engine logger is known.
///
/// Buffers `log`/`log_with_ack` calls up to a fixed capacity; on overflow
/// the oldest buffered call is dropped (its `log_with_ack` future, if any,
/// resolves to [`LogaryError::BackpressureDrop`]). Once [`PromisedLogger::resolve`]
/// is called, buffered calls replay, in order, against the real logger.
pub struct PromisedLogger {
    name: PointName,
    state: Mutex<State>,
}

impl fmt::Debug for PromisedLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let resolved = matches!(&*self.state.lock(), State::Resolved(_));
        f.debug_struct("PromisedLogger")
            .field("name", &self.name)
            .field("resolved", &resolved)
            .finish()
    }
}

/// Default buffer capacity used by `getLoggerSync` when not overridden.
pub const DEFAULT_BUFFER_CAPACITY: usize = 256;

impl PromisedLogger {
    /// Creates an unresolved logger for `name` with room for `capacity`
    /// buffered calls.
    pub fn new(name: PointName, capacity: usize) -> Arc<PromisedLogger> {
        Arc::new(PromisedLogger {
            name,
            state: Mutex::new(State::Buffering {
                buffer: VecDeque::new(),
                capacity: capacity.max(1),
            }),
        })
    }

    /// Installs `logger` as the real backing logger and replays any
    /// buffered calls against it, in arrival order. A no-op if already
    /// resolved.
    pub fn resolve(self: &Arc<Self>, logger: Arc<dyn Logger>) {
        let buffered = {
            let mut state = self.state.lock();
            if matches!(&*state, State::Resolved(_)) {
                return;
            }
            match std::mem::replace(&mut *state, State::Resolved(logger.clone())) {
                State::Buffering { buffer, .. } => buffer,
                State::Resolved(_) => unreachable!(),
            }
        };
        if buffered.is_empty() {
            return;
        }
        tokio::spawn(async move {
            for entry in buffered {
                let result = logger.log_with_ack(entry.level, entry.factory).await;
                if let Some(ack) = entry.ack {
                    let _ = ack.send(result);
                }
            }
        });
    }
}

#[async_trait]
impl Logger for PromisedLogger {
    fn name(&self) -> &PointName {
        &self.name
    }

    fn level(&self) -> LogLevel {
        match &*self.state.lock() {
            State::Resolved(logger) => logger.level(),
            // Admit everything pre-resolution; the real logger's level
            // filter is applied at replay time in `resolve`.
            State::Buffering { .. } => LogLevel::Verbose,
        }
    }

    fn log(&self, level: LogLevel, factory: MessageFactory) -> Result<CommitAck, LogaryError> {
        let mut state = self.state.lock();
        match &mut *state {
            State::Resolved(logger) => logger.log(level, factory),
            State::Buffering { buffer, capacity } => {
                if buffer.len() >= *capacity {
                    buffer.pop_front();
                }
                buffer.push_back(BufferedEntry {
                    level,
                    factory,
                    ack: None,
                });
                Ok(CommitAck::Committed)
            }
        }
    }

    async fn log_with_ack(
        &self,
        level: LogLevel,
        factory: MessageFactory,
    ) -> Result<Ack, LogaryError> {
        enum Action {
            Resolved(Arc<dyn Logger>, MessageFactory),
            Buffered(oneshot::Receiver<Result<Ack, LogaryError>>),
        }

        let action = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Resolved(logger) => Action::Resolved(logger.clone(), factory),
                State::Buffering { buffer, capacity } => {
                    if buffer.len() >= *capacity {
                        if let Some(dropped) = buffer.pop_front() {
                            if let Some(ack) = dropped.ack {
                                let _ = ack.send(Err(LogaryError::BackpressureDrop));
                            }
                        }
                    }
                    let (tx, rx) = oneshot::channel();
                    buffer.push_back(BufferedEntry {
                        level,
                        factory,
                        ack: Some(tx),
                    });
                    Action::Buffered(rx)
                }
            }
        };

        match action {
            Action::Resolved(logger, factory) => logger.log_with_ack(level, factory).await,
            Action::Buffered(rx) => rx.await.map_err(|_| LogaryError::Stopped)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logary_core::{Message, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    #[derive(Debug)]
    struct RecordingLogger {
        name: PointName,
        received: StdMutex<Vec<Message>>,
    }

    #[async_trait]
    impl Logger for RecordingLogger {
        fn name(&self) -> &PointName {
            &self.name
        }
        fn level(&self) -> LogLevel {
            LogLevel::Info
        }
        fn log(&self, level: LogLevel, factory: MessageFactory) -> Result<CommitAck, LogaryError> {
            self.received.lock().unwrap().push(factory(level));
            Ok(CommitAck::Committed)
        }
        async fn log_with_ack(
            &self,
            level: LogLevel,
            factory: MessageFactory,
        ) -> Result<Ack, LogaryError> {
            self.received.lock().unwrap().push(factory(level));
            Ok(Ack)
        }
    }

    fn name() -> PointName {
        PointName::new(["app"])
    }

    #[tokio::test]
    async fn buffered_calls_replay_in_order_on_resolve() {
        let promised = PromisedLogger::new(name(), 8);
        for i in 0..5i64 {
            promised
                .log(LogLevel::Info, Box::new(move |l| {
                    Message::event(name(), l, Value::Int64(i))
                }))
                .unwrap();
        }

        let real = Arc::new(RecordingLogger {
            name: name(),
            received: StdMutex::new(Vec::new()),
        });
        promised.resolve(real.clone() as Arc<dyn Logger>);

        // Give the replay task a chance to run.
        for _ in 0..20 {
            if real.received.lock().unwrap().len() == 5 {
                break;
            }
            tokio::task::yield_now().await;
        }

        let got = real.received.lock().unwrap();
        let values: Vec<i64> = got
            .iter()
            .map(|m| match m.value() {
                Value::Int64(v) => *v,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn overflow_drops_oldest_and_nacks_its_ack() {
        let promised = PromisedLogger::new(name(), 2);
        let attempt_count = Arc::new(AtomicUsize::new(0));

        // Spawned one at a time with a yield in between so each task's
        // buffer insertion (the synchronous prefix of `log_with_ack`, up to
        // its first `.await`) happens in a known order on this
        // current-thread test runtime.
        let mut acks = Vec::new();
        for i in 0..3i64 {
            let attempt_count = attempt_count.clone();
            let promised = promised.clone();
            let fut = async move {
                promised
                    .log_with_ack(
                        LogLevel::Info,
                        Box::new(move |l| {
                            attempt_count.fetch_add(1, Ordering::SeqCst);
                            Message::event(name(), l, Value::Int64(i))
                        }),
                    )
                    .await
            };
            acks.push(tokio::spawn(fut));
            tokio::task::yield_now().await;
        }

        // Resolving drains the two survivors so their futures complete too;
        // otherwise they'd wait forever on an ack nothing would ever send.
        let real = Arc::new(RecordingLogger {
            name: name(),
            received: StdMutex::new(Vec::new()),
        });
        promised.resolve(real as Arc<dyn Logger>);

        // The first of the 3 should have been evicted (capacity 2) and its
        // ack resolved with BackpressureDrop, not left pending.
        let results: Vec<_> = futures::future::join_all(acks).await;
        let first = results[0].as_ref().unwrap();
        assert_eq!(*first, Err(LogaryError::BackpressureDrop));
        assert!(results[1].as_ref().unwrap().is_ok());
        assert!(results[2].as_ref().unwrap().is_ok());
    }

    #[tokio::test]
    async fn calls_after_resolve_pass_through_immediately() {
        let promised = PromisedLogger::new(name(), 4);
        let real = Arc::new(RecordingLogger {
            name: name(),
            received: StdMutex::new(Vec::new()),
        });
        promised.resolve(real.clone() as Arc<dyn Logger>);

        promised
            .log_with_ack(LogLevel::Info, Box::new(|l| {
                Message::event(name(), l, Value::string("direct"))
            }))
            .await
            .unwrap();

        assert_eq!(real.received.lock().unwrap().len(), 1);
    }
}
