//! The uniform `Service<T>` wrapper every target, metric, and health check
//! is spawned into (§4.6).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use logary_core::{LogaryError, Message, Service, ServiceState, TargetSink};
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};

enum Control {
    Pause(oneshot::Sender<()>),
    Resume(oneshot::Sender<()>),
    Flush(oneshot::Sender<anyhow::Result<()>>),
    Shutdown(oneshot::Sender<()>),
}

enum SinkMsg {
    Send(Message, Option<oneshot::Sender<()>>),
}

/// A running, supervised wrapper around a user-supplied [`TargetSink`].
///
/// Owns its own actor task; `pause`/`resume`/`shutdown` and message delivery
/// are all serialized through it, so `state()` observed via the shared cell
/// is always consistent with in-flight control operations without a channel
/// round trip (mirrors the `reload::Handle` idiom of swapping shared state
/// behind a lock rather than always going through the actor for reads).
pub struct SupervisedService {
    name: String,
    state: Arc<RwLock<ServiceState>>,
    control_tx: mpsc::UnboundedSender<Control>,
    sink_tx: mpsc::Sender<SinkMsg>,
}

impl SupervisedService {
    /// Spawns `sink` as a supervised actor named `name`.
    pub fn spawn(name: impl Into<String>, sink: Box<dyn TargetSink>) -> Arc<SupervisedService> {
        let name = name.into();
        let state = Arc::new(RwLock::new(ServiceState::Starting));
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (sink_tx, sink_rx) = mpsc::channel(256);

        tokio::spawn(run(sink, state.clone(), control_rx, sink_rx));
        *state.write() = ServiceState::Running;

        Arc::new(SupervisedService {
            name,
            state,
            control_tx,
            sink_tx,
        })
    }

    /// A [`TargetSink`] adaptor that forwards deliveries through this
    /// service's actor, so engine-subscribed sends observe the same
    /// pause/shutdown semantics as direct control calls.
    pub fn as_target_sink(self: &Arc<Self>) -> Arc<dyn TargetSink> {
        Arc::new(SinkHandle(self.clone()))
    }

    /// Requests a flush and waits for the sink to acknowledge it.
    pub async fn flush(&self) -> anyhow::Result<()> {
        let (tx, rx) = oneshot::channel();
        if self.control_tx.send(Control::Flush(tx)).is_err() {
            return Ok(()); // already stopped; nothing to flush
        }
        match rx.await {
            Ok(result) => result,
            Err(_) => Ok(()),
        }
    }
}

struct SinkHandle(Arc<SupervisedService>);

#[async_trait]
impl TargetSink for SinkHandle {
    async fn send(&self, message: Message) -> anyhow::Result<()> {
        let (tx, rx) = oneshot::channel();
        self.0
            .sink_tx
            .send(SinkMsg::Send(message, Some(tx)))
            .await
            .map_err(|_| anyhow::anyhow!("service '{}' is stopped", self.0.name))?;
        rx.await
            .map_err(|_| anyhow::anyhow!("service '{}' faulted before acking", self.0.name))
    }

    async fn flush(&self) -> anyhow::Result<()> {
        self.0.flush().await
    }
}

#[async_trait]
impl Service for SupervisedService {
    fn name(&self) -> &str {
        &self.name
    }

    async fn state(&self) -> ServiceState {
        self.state.read().clone()
    }

    async fn pause(&self) -> Result<(), LogaryError> {
        let (tx, rx) = oneshot::channel();
        self.control_tx
            .send(Control::Pause(tx))
            .map_err(|_| LogaryError::Stopped)?;
        rx.await.map_err(|_| LogaryError::Stopped)
    }

    async fn resume(&self) -> Result<(), LogaryError> {
        let (tx, rx) = oneshot::channel();
        self.control_tx
            .send(Control::Resume(tx))
            .map_err(|_| LogaryError::Stopped)?;
        rx.await.map_err(|_| LogaryError::Stopped)
    }

    async fn shutdown(&self, timeout: Option<Duration>) -> Result<(), LogaryError> {
        let (tx, rx) = oneshot::channel();
        if self.control_tx.send(Control::Shutdown(tx)).is_err() {
            return Ok(());
        }
        match timeout {
            Some(d) => tokio::time::timeout(d, rx)
                .await
                .map_err(|_| LogaryError::Timeout)?
                .map_err(|_| LogaryError::Stopped),
            None => rx.await.map_err(|_| LogaryError::Stopped),
        }
    }
}

async fn run(
    mut sink: Box<dyn TargetSink>,
    state: Arc<RwLock<ServiceState>>,
    mut control_rx: mpsc::UnboundedReceiver<Control>,
    mut sink_rx: mpsc::Receiver<SinkMsg>,
) {
    let mut paused = false;
    loop {
        tokio::select! {
            biased;

            Some(ctrl) = control_rx.recv() => match ctrl {
                Control::Pause(ack) => {
                    paused = true;
                    *state.write() = ServiceState::Paused;
                    let _ = ack.send(());
                }
                Control::Resume(ack) => {
                    paused = false;
                    *state.write() = ServiceState::Running;
                    let _ = ack.send(());
                }
                Control::Flush(ack) => {
                    let _ = ack.send(sink.flush().await);
                }
                Control::Shutdown(ack) => {
                    let _ = sink.flush().await;
                    let _ = sink.shutdown().await;
                    *state.write() = ServiceState::Stopped;
                    let _ = ack.send(());
                    return;
                }
            },
            Some(SinkMsg::Send(message, ack)) = sink_rx.recv(), if !paused => {
                match sink.send(message).await {
                    Ok(()) => {
                        if let Some(ack) = ack {
                            let _ = ack.send(());
                        }
                    }
                    Err(err) => {
                        *state.write() = ServiceState::Faulted(err.to_string());
                        // Drop the ack: the caller observes the closed
                        // oneshot as a fault, per SinkHandle::send.
                        drop(ack);
                    }
                }
            }
            else => break,
        }
    }
}
