//! The message router (§4.2): a single-threaded cooperative actor that owns
//! the subscriber mapping and drains the engine's four channels
//! (`input`, `emit`, `subscribe`, `shutdown`).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use logary_core::{Ack, CommitAck, LogLevel, LogaryError, Message, TargetSink};
use tokio::sync::{mpsc, oneshot};

/// A `Message x EmitSink -> task<unit>` processing function, the engine's
/// sole extension point (§4.2).
pub type ProcessingFn =
    Arc<dyn Fn(Message, EmitSink) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Capability a running processing invocation uses to forward messages
/// toward the target layer. May be called zero or more times.
#[derive(Clone)]
pub struct EmitSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl EmitSink {
    /// Forwards `message` for routing. Non-blocking; routing itself happens
    /// after the processing future completes, preserving per-ingress FIFO
    /// (§4.2 "Ordering").
    pub fn emit(&self, message: Message) {
        // The receiving end only goes away when the engine itself is
        // shutting down, in which case dropping the message is correct.
        let _ = self.tx.send(message);
    }
}

struct InputMsg {
    level: LogLevel,
    factory: logary_core::MessageFactory,
    ack: Option<oneshot::Sender<Result<Ack, LogaryError>>>,
}

enum SubscriberMsg {
    Subscribe(String, Arc<dyn TargetSink>),
    Unsubscribe(String),
}

/// A clonable client handle to a running [`Engine`] actor.
#[derive(Clone)]
pub struct EngineHandle {
    input_tx: mpsc::Sender<InputMsg>,
    subscriber_tx: mpsc::UnboundedSender<SubscriberMsg>,
    shutdown_tx: mpsc::UnboundedSender<oneshot::Sender<()>>,
    stopped: Arc<AtomicBool>,
    dropped: Arc<AtomicU64>,
    routing_misses: Arc<AtomicU64>,
}

/// Default bound on the engine's input channel when a `LogaryConf` doesn't
/// override it. See SPEC_FULL.md §11.
pub const DEFAULT_INGRESS_CAPACITY: usize = 1024;

impl EngineHandle {
    /// Spawns a new engine actor running `processing`, with an ingress
    /// bounded at `ingress_capacity`, and returns a handle to it.
    pub fn spawn(processing: ProcessingFn, ingress_capacity: usize) -> EngineHandle {
        let (input_tx, input_rx) = mpsc::channel(ingress_capacity.max(1));
        let (subscriber_tx, subscriber_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        let (emit_tx, emit_rx) = mpsc::unbounded_channel();

        let dropped = Arc::new(AtomicU64::new(0));
        let routing_misses = Arc::new(AtomicU64::new(0));
        let stopped = Arc::new(AtomicBool::new(false));

        let handle = EngineHandle {
            input_tx,
            subscriber_tx,
            shutdown_tx,
            stopped: stopped.clone(),
            dropped: dropped.clone(),
            routing_misses: routing_misses.clone(),
        };

        tokio::spawn(run(
            processing,
            input_rx,
            subscriber_rx,
            shutdown_rx,
            emit_tx,
            emit_rx,
            routing_misses,
            stopped,
        ));

        handle
    }

    /// Registers `sink` under `key`. Idempotent: a second call with the
    /// same key replaces the prior sink (§4.2).
    pub fn subscribe(&self, key: impl Into<String>, sink: Arc<dyn TargetSink>) {
        let _ = self
            .subscriber_tx
            .send(SubscriberMsg::Subscribe(key.into(), sink));
    }

    /// Removes the sink registered under `key`. A missing key is a no-op.
    pub fn unsubscribe(&self, key: impl Into<String>) {
        let _ = self.subscriber_tx.send(SubscriberMsg::Unsubscribe(key.into()));
    }

    /// Non-blocking send. Implements the "drop-on-full" reading of the open
    /// question in §9: `BufferFull` is returned as a `CommitAck`, not an
    /// error, matching "callers treat this as a drop signal".
    pub fn log(
        &self,
        level: LogLevel,
        factory: logary_core::MessageFactory,
    ) -> Result<CommitAck, LogaryError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(LogaryError::Stopped);
        }
        match self.input_tx.try_send(InputMsg {
            level,
            factory,
            ack: None,
        }) {
            Ok(()) => Ok(CommitAck::Committed),
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Ok(CommitAck::BufferFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(LogaryError::Stopped),
        }
    }

    /// Sends and awaits acceptance by the processing pipeline.
    pub async fn log_with_ack(
        &self,
        level: LogLevel,
        factory: logary_core::MessageFactory,
    ) -> Result<Ack, LogaryError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(LogaryError::Stopped);
        }
        let (ack_tx, ack_rx) = oneshot::channel();
        self.input_tx
            .send(InputMsg {
                level,
                factory,
                ack: Some(ack_tx),
            })
            .await
            .map_err(|_| LogaryError::Stopped)?;
        ack_rx.await.map_err(|_| LogaryError::Stopped)?
    }

    /// Signals the engine to terminate. Idempotent.
    pub async fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        let (tx, rx) = oneshot::channel();
        if self.shutdown_tx.send(tx).is_ok() {
            let _ = rx.await;
        }
    }

    /// Number of messages dropped because the ingress was saturated.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Number of emitted messages that named an unknown (or missing)
    /// target and were silently dropped (§4.2 "Target selection").
    pub fn routing_miss_count(&self) -> u64 {
        self.routing_misses.load(Ordering::Relaxed)
    }
}

#[allow(clippy::too_many_arguments)]
async fn run(
    processing: ProcessingFn,
    mut input_rx: mpsc::Receiver<InputMsg>,
    mut subscriber_rx: mpsc::UnboundedReceiver<SubscriberMsg>,
    mut shutdown_rx: mpsc::UnboundedReceiver<oneshot::Sender<()>>,
    emit_tx: mpsc::UnboundedSender<Message>,
    mut emit_rx: mpsc::UnboundedReceiver<Message>,
    routing_misses: Arc<AtomicU64>,
    stopped: Arc<AtomicBool>,
) {
    // Exclusively owned by this task for its entire lifetime (§3 "Engine
    // state" invariant): no other task ever reads or writes it directly.
    // Each entry is a handle to that target's own worker task rather than
    // the sink itself, so routing a message never blocks on that target's
    // write (§4.2, §5 "per-target independence").
    let mut subscribers: HashMap<String, mpsc::UnboundedSender<Message>> = HashMap::new();

    loop {
        tokio::select! {
            biased;

            Some(reply) = shutdown_rx.recv() => {
                stopped.store(true, Ordering::Release);
                let _ = reply.send(());
                break;
            }
            Some(sub_msg) = subscriber_rx.recv() => {
                match sub_msg {
                    SubscriberMsg::Subscribe(key, sink) => { subscribers.insert(key, spawn_target_worker(sink)); }
                    SubscriberMsg::Unsubscribe(key) => { subscribers.remove(&key); }
                }
            }
            Some(emitted) = emit_rx.recv() => {
                // Catches emits made after their processing invocation's
                // future already resolved (e.g. from a spawned task); the
                // common synchronous case is drained below instead, so the
                // ack isn't held up waiting on this arm to be polled.
                dispatch(&subscribers, emitted, &routing_misses);
            }
            Some(input) = input_rx.recv() => {
                let message = (input.factory)(input.level);
                let sink = EmitSink { tx: emit_tx.clone() };
                (processing)(message, sink).await;

                // Resolved now: accepted by the processing pipeline, not
                // once targets have written it (§4.1). Independent of
                // dispatch below, which only forwards to each target's own
                // worker and never awaits a write.
                if let Some(ack) = input.ack {
                    let _ = ack.send(Ok(Ack));
                }

                // Drain whatever this single processing call produced
                // synchronously before accepting the next input, preserving
                // per-ingress ordering (§4.2, §5).
                while let Ok(emitted) = emit_rx.try_recv() {
                    dispatch(&subscribers, emitted, &routing_misses);
                }
            }
            else => break,
        }
    }
}

/// Spawns the task that owns `sink` for as long as it's subscribed, draining
/// its queue strictly in arrival order. Delivery to a slow or faulting sink
/// never blocks the engine loop or any other target's queue; a send error
/// faults the sink's own supervised service, and the engine keeps going
/// regardless (§7).
fn spawn_target_worker(sink: Arc<dyn TargetSink>) -> mpsc::UnboundedSender<Message> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let _ = sink.send(message).await;
        }
    });
    tx
}

fn dispatch(
    subscribers: &HashMap<String, mpsc::UnboundedSender<Message>>,
    message: Message,
    routing_misses: &AtomicU64,
) {
    match message.target().and_then(|name| subscribers.get(name)) {
        Some(tx) => {
            let _ = tx.send(message);
        }
        None => {
            routing_misses.fetch_add(1, Ordering::Relaxed);
        }
    }
}
