//! Process-wide logger configuration with an explicit pause/resume/shutdown
//! lifecycle that restores the previous configuration on pause and on
//! shutdown (§4.5).
//!
//! The "global mutable cell" is a single-writer, multi-reader
//! `parking_lot::RwLock` behind a `once_cell::sync::Lazy` static — the
//! concrete mechanism the design notes in §9 ask for, rather than an
//! unsynchronized global.

use std::sync::Arc;

use logary_core::{Logger, PointName};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot};

/// The capability set installed process-wide: at minimum, how to resolve a
/// [`PointName`] to a [`Logger`] (§4.5: "Process-wide configuration `T`
/// (at minimum: the `getLogger`/`getLoggerWithMiddleware` capabilities)").
#[derive(Clone)]
pub struct GlobalConfig {
    get_logger: Arc<dyn Fn(&PointName) -> Arc<dyn Logger> + Send + Sync>,
}

impl GlobalConfig {
    /// Builds a config from a logger-resolution closure.
    pub fn new(get_logger: impl Fn(&PointName) -> Arc<dyn Logger> + Send + Sync + 'static) -> Self {
        GlobalConfig {
            get_logger: Arc::new(get_logger),
        }
    }

    /// Resolves `name` to a logger using this configuration.
    pub fn get_logger(&self, name: &PointName) -> Arc<dyn Logger> {
        (self.get_logger)(name)
    }
}

static GLOBAL_CELL: Lazy<RwLock<Option<GlobalConfig>>> = Lazy::new(|| RwLock::new(None));

fn swap(new: Option<GlobalConfig>) -> Option<GlobalConfig> {
    std::mem::replace(&mut *GLOBAL_CELL.write(), new)
}

/// Resolves `name` against whatever configuration is currently installed
/// globally, if any.
pub fn get_logger(name: &PointName) -> Option<Arc<dyn Logger>> {
    GLOBAL_CELL.read().as_ref().map(|c| c.get_logger(name))
}

enum Control {
    Pause(oneshot::Sender<()>),
    Resume(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// A clonable client handle to a running Globals service actor.
#[derive(Clone)]
pub struct GlobalsHandle {
    control_tx: mpsc::UnboundedSender<Control>,
}

impl GlobalsHandle {
    /// Installs `config` as the new global configuration, remembering
    /// whatever was installed before as the "previous" configuration that
    /// `pause`/`shutdown` restore (§4.5's "init" transition).
    pub fn start(config: GlobalConfig) -> GlobalsHandle {
        let previous = swap(Some(config.clone()));
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        tokio::spawn(run(config, previous, control_rx));
        GlobalsHandle { control_tx }
    }

    /// Re-installs the previous configuration, enabling nested temporary
    /// reconfiguration (e.g. a test harness) without losing state.
    pub async fn pause(&self) -> Result<(), logary_core::LogaryError> {
        self.roundtrip(Control::Pause).await
    }

    /// Re-installs the configuration this handle was started with.
    pub async fn resume(&self) -> Result<(), logary_core::LogaryError> {
        self.roundtrip(Control::Resume).await
    }

    /// Re-installs the previous configuration and stops the service.
    /// Terminal: further calls on this handle fail with `Stopped`.
    pub async fn shutdown(&self) -> Result<(), logary_core::LogaryError> {
        self.roundtrip(Control::Shutdown).await
    }

    async fn roundtrip(
        &self,
        make: impl FnOnce(oneshot::Sender<()>) -> Control,
    ) -> Result<(), logary_core::LogaryError> {
        let (tx, rx) = oneshot::channel();
        self.control_tx
            .send(make(tx))
            .map_err(|_| logary_core::LogaryError::Stopped)?;
        rx.await.map_err(|_| logary_core::LogaryError::Stopped)
    }
}

async fn run(
    current: GlobalConfig,
    previous: Option<GlobalConfig>,
    mut control_rx: mpsc::UnboundedReceiver<Control>,
) {
    while let Some(ctrl) = control_rx.recv().await {
        match ctrl {
            Control::Pause(ack) => {
                swap(previous.clone());
                let _ = ack.send(());
            }
            Control::Resume(ack) => {
                swap(Some(current.clone()));
                let _ = ack.send(());
            }
            Control::Shutdown(ack) => {
                swap(previous.clone());
                let _ = ack.send(());
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logary_core::{CommitAck, LogLevel, LogaryError, MessageFactory};

    #[derive(Debug)]
    struct TaggedLogger(&'static str, PointName);

    #[async_trait::async_trait]
    impl Logger for TaggedLogger {
        fn name(&self) -> &PointName {
            &self.1
        }
        fn level(&self) -> LogLevel {
            LogLevel::Verbose
        }
        fn log(&self, _level: LogLevel, _factory: MessageFactory) -> Result<CommitAck, LogaryError> {
            Ok(CommitAck::Committed)
        }
        async fn log_with_ack(
            &self,
            _level: LogLevel,
            _factory: MessageFactory,
        ) -> Result<logary_core::Ack, LogaryError> {
            Ok(logary_core::Ack)
        }
    }

    fn tagged(tag: &'static str) -> GlobalConfig {
        GlobalConfig::new(move |name| Arc::new(TaggedLogger(tag, name.clone())) as Arc<dyn Logger>)
    }

    // Serialize the tests in this module: they share the process-global
    // cell, so concurrent test threads would otherwise race each other.
    static TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[tokio::test]
    async fn pause_resume_shutdown_restores_previous() {
        let _guard = TEST_LOCK.lock().unwrap();

        swap(Some(tagged("root")));
        let name = PointName::new(["app"]);

        let handle = GlobalsHandle::start(tagged("A"));
        assert!(get_logger(&name).is_some());

        handle.pause().await.unwrap();
        // Restored to whatever was installed before `start`: "root".
        let restored = get_logger(&name).unwrap();
        assert!(format!("{:?}", restored).contains("root"));

        handle.resume().await.unwrap();
        let resumed = get_logger(&name).unwrap();
        assert!(format!("{:?}", resumed).contains('A'));

        handle.shutdown().await.unwrap();
        let after_shutdown = get_logger(&name).unwrap();
        assert!(format!("{:?}", after_shutdown).contains("root"));

        swap(None);
    }
}
