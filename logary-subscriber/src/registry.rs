//! The composition root (§4.4): owns the engine and every supervised
//! target/metric/health-check, serves logger handles, and implements
//! ordered flush/shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use logary_core::{
    Ack, CommitAck, FlushInfo, LogLevel, LogaryError, Logger, Message, MessageFactory, PointName,
    RuntimeInfo, Service, ServiceKind, ShutdownInfo, TargetFactory, TargetSink, Value,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::conf::LogaryConf;
use crate::engine::EngineHandle;
use crate::globals::{GlobalConfig, GlobalsHandle};
use crate::middleware::{self, Middleware};
use crate::promised_logger::{self, PromisedLogger};
use crate::supervised::SupervisedService;

const SUPERVISION_POLL_INTERVAL: Duration = Duration::from_millis(200);
const RESTART_DELAY: Duration = Duration::from_millis(500);
/// Stand-in for "no deadline" so the flush loop can always select against a
/// single sleep future rather than branching on `Option<Sleep>`.
const NO_TIMEOUT_SENTINEL: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 100);

fn registry_logger_name() -> PointName {
    PointName::new(["Logary", "Registry"])
}

struct Entry {
    name: String,
    kind: ServiceKind,
    factory: Arc<dyn TargetFactory>,
    service: Arc<SupervisedService>,
    restart_pending: bool,
}

impl Entry {
    fn scoped_name(kind: ServiceKind, name: &str) -> PointName {
        PointName::new([String::from("Logary"), format!("{}({})", kind, name)])
    }
}

/// A `Logger` backed by the engine, carrying this registry's default level
/// and the composed registry+call-site middleware for the name it was
/// obtained under.
struct EngineLogger {
    name: PointName,
    level: LogLevel,
    engine: EngineHandle,
    middleware: Middleware,
}

impl std::fmt::Debug for EngineLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineLogger")
            .field("name", &self.name)
            .field("level", &self.level)
            .finish()
    }
}

#[async_trait::async_trait]
impl Logger for EngineLogger {
    fn name(&self) -> &PointName {
        &self.name
    }

    fn level(&self) -> LogLevel {
        self.level
    }

    fn log(&self, level: LogLevel, factory: MessageFactory) -> Result<CommitAck, LogaryError> {
        if level < self.level {
            return Ok(CommitAck::Committed);
        }
        let middleware = self.middleware.clone();
        self.engine
            .log(level, Box::new(move |lvl| middleware(factory(lvl))))
    }

    async fn log_with_ack(
        &self,
        level: LogLevel,
        factory: MessageFactory,
    ) -> Result<Ack, LogaryError> {
        if level < self.level {
            return Ok(Ack);
        }
        let middleware = self.middleware.clone();
        self.engine
            .log_with_ack(level, Box::new(move |lvl| middleware(factory(lvl))))
            .await
    }
}

enum Control {
    GetLogger {
        name: PointName,
        call_site_middleware: Option<Middleware>,
        reply: oneshot::Sender<Arc<dyn Logger>>,
    },
    Flush {
        timeout: Option<Duration>,
        reply: oneshot::Sender<FlushInfo>,
    },
    Shutdown {
        timeout: Option<Duration>,
        reply: oneshot::Sender<ShutdownInfo>,
    },
}

enum RestartOutcome {
    Ready {
        kind: ServiceKind,
        name: String,
        service: Arc<SupervisedService>,
    },
    Failed {
        kind: ServiceKind,
        name: String,
        factory: Arc<dyn TargetFactory>,
        error: String,
    },
}

/// A clonable client handle to a running registry actor.
#[derive(Clone, Debug)]
pub struct RegistryHandle {
    control_tx: mpsc::UnboundedSender<Control>,
    runtime_info: RuntimeInfo,
    stopped: Arc<AtomicBool>,
}

impl RegistryHandle {
    /// Builds every target, metric, and health check from `conf`, wires
    /// them into a fresh engine, and starts supervision (§4.4 steps 1-6).
    ///
    /// Fails with `LogaryError::Configuration` if two entries of the same
    /// kind share a name, or if any factory errors while constructing its
    /// sink — nothing is left half-started in that case.
    pub fn create(conf: LogaryConf) -> Result<RegistryHandle, LogaryError> {
        reject_duplicate_names(&conf.targets)?;
        reject_duplicate_names(&conf.metrics)?;
        reject_duplicate_names(&conf.health_checks)?;

        let engine = EngineHandle::spawn(conf.processing.clone(), conf.ingress_capacity);

        let internal_logger: Arc<dyn Logger> = Arc::new(EngineLogger {
            name: registry_logger_name(),
            level: LogLevel::Verbose,
            engine: engine.clone(),
            middleware: middleware::identity(),
        });
        let runtime_info = conf.runtime_info.with_logger(internal_logger.clone());

        let targets = spawn_group(ServiceKind::Target, &conf.targets, &runtime_info)?;
        let metrics = spawn_group(ServiceKind::Metric, &conf.metrics, &runtime_info)?;
        let health_checks = spawn_group(ServiceKind::HealthCheck, &conf.health_checks, &runtime_info)?;

        for entry in targets.iter().chain(metrics.iter()) {
            engine.subscribe(entry.name.clone(), entry.service.as_target_sink());
        }

        let registry_middleware = middleware::chain(conf.middleware.clone());
        let default_level = conf.default_level;

        let globals = GlobalsHandle::start(GlobalConfig::new({
            let engine = engine.clone();
            let middleware = registry_middleware.clone();
            move |name: &PointName| {
                Arc::new(EngineLogger {
                    name: name.clone(),
                    level: default_level,
                    engine: engine.clone(),
                    middleware: middleware.clone(),
                }) as Arc<dyn Logger>
            }
        }));

        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let stopped = Arc::new(AtomicBool::new(false));

        tokio::spawn(run(
            control_rx,
            engine,
            targets,
            metrics,
            health_checks,
            globals,
            registry_middleware,
            default_level,
            runtime_info.clone(),
            internal_logger,
            stopped.clone(),
        ));

        Ok(RegistryHandle {
            control_tx,
            runtime_info,
            stopped,
        })
    }

    /// The process `RuntimeInfo` this registry was created with (internal
    /// logger already substituted in).
    pub fn runtime_info(&self) -> &RuntimeInfo {
        &self.runtime_info
    }

    /// Resolves `name` to a `Logger`, composing registry middleware with
    /// `call_site_middleware` if given (§4.4 "getLogger").
    pub async fn get_logger_with_middleware(
        &self,
        name: PointName,
        call_site_middleware: Option<Middleware>,
    ) -> Result<Arc<dyn Logger>, LogaryError> {
        if self.stopped.load(Ordering::Acquire) {
            return Err(LogaryError::Stopped);
        }
        let (tx, rx) = oneshot::channel();
        self.control_tx
            .send(Control::GetLogger {
                name,
                call_site_middleware,
                reply: tx,
            })
            .map_err(|_| LogaryError::Stopped)?;
        rx.await.map_err(|_| LogaryError::Stopped)
    }

    /// `getLogger(name)` with no call-site middleware.
    pub async fn get_logger(&self, name: PointName) -> Result<Arc<dyn Logger>, LogaryError> {
        self.get_logger_with_middleware(name, None).await
    }

    /// `getLoggerSync` (§6): returns a buffering proxy immediately; it
    /// resolves against the real logger once the registry actor answers.
    pub fn get_logger_sync(&self, name: PointName) -> Arc<PromisedLogger> {
        let promised = PromisedLogger::new(name.clone(), promised_logger::DEFAULT_BUFFER_CAPACITY);
        let handle = self.clone();
        let target = promised.clone();
        tokio::spawn(async move {
            if let Ok(real) = handle.get_logger(name).await {
                target.resolve(real);
            }
        });
        promised
    }

    /// Broadcasts a flush to every target, waiting up to `timeout` (if
    /// given) for acks. Dropping the returned future before it resolves
    /// "nacks" the request: the registry observes the closed reply channel
    /// and aborts remaining work for it (§5 "Cancellation").
    pub async fn flush(&self, timeout: Option<Duration>) -> Result<FlushInfo, LogaryError> {
        let (tx, rx) = oneshot::channel();
        self.control_tx
            .send(Control::Flush { timeout, reply: tx })
            .map_err(|_| LogaryError::Stopped)?;
        rx.await.map_err(|_| LogaryError::Stopped)
    }

    /// Flushes (best-effort) then shuts every service down in reverse
    /// dependency order. Not cancellable (§5). Terminal: subsequent calls
    /// on this handle fail with `Stopped`.
    pub async fn shutdown(
        &self,
        flush_timeout: Option<Duration>,
        shutdown_timeout: Option<Duration>,
    ) -> Result<(FlushInfo, ShutdownInfo), LogaryError> {
        let flush_info = self.flush(flush_timeout).await.unwrap_or_default();
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Err(LogaryError::Stopped);
        }
        let (tx, rx) = oneshot::channel();
        self.control_tx
            .send(Control::Shutdown {
                timeout: shutdown_timeout,
                reply: tx,
            })
            .map_err(|_| LogaryError::Stopped)?;
        let shutdown_info = rx.await.map_err(|_| LogaryError::Stopped)?;
        Ok((flush_info, shutdown_info))
    }
}

fn reject_duplicate_names<C: NamedFactory>(confs: &[C]) -> Result<(), LogaryError> {
    let mut seen = std::collections::HashSet::new();
    for conf in confs {
        if !seen.insert(conf.name()) {
            return Err(LogaryError::Configuration(format!(
                "duplicate service name '{}'",
                conf.name()
            )));
        }
    }
    Ok(())
}

fn spawn_group<C>(
    kind: ServiceKind,
    confs: &[C],
    runtime_info: &RuntimeInfo,
) -> Result<Vec<Entry>, LogaryError>
where
    C: NamedFactory,
{
    confs
        .iter()
        .map(|conf| {
            let name = conf.name().to_string();
            let sink = conf.factory().create(runtime_info).map_err(|err| {
                LogaryError::Configuration(format!(
                    "failed to construct {} '{}': {}",
                    kind, name, err
                ))
            })?;
            let service = SupervisedService::spawn(Entry::scoped_name(kind, &name).as_dotted(), sink);
            Ok(Entry {
                name,
                kind,
                factory: conf.factory().clone(),
                service,
                restart_pending: false,
            })
        })
        .collect()
}

trait NamedFactory {
    fn name(&self) -> &str;
    fn factory(&self) -> &Arc<dyn TargetFactory>;
}

impl NamedFactory for logary_core::TargetConf {
    fn name(&self) -> &str {
        logary_core::TargetConf::name(self)
    }
    fn factory(&self) -> &Arc<dyn TargetFactory> {
        logary_core::TargetConf::factory(self)
    }
}

impl NamedFactory for logary_core::MetricConf {
    fn name(&self) -> &str {
        logary_core::MetricConf::name(self)
    }
    fn factory(&self) -> &Arc<dyn TargetFactory> {
        logary_core::MetricConf::factory(self)
    }
}

impl NamedFactory for logary_core::HealthCheckConf {
    fn name(&self) -> &str {
        logary_core::HealthCheckConf::name(self)
    }
    fn factory(&self) -> &Arc<dyn TargetFactory> {
        logary_core::HealthCheckConf::factory(self)
    }
}

fn log_info(logger: &Arc<dyn Logger>, text: String) {
    let logger = logger.clone();
    tokio::spawn(async move {
        let _ = logger
            .log_with_ack(
                LogLevel::Info,
                Box::new(move |level| Message::event(registry_logger_name(), level, Value::string(text))),
            )
            .await;
    });
}

fn log_error(logger: &Arc<dyn Logger>, text: String) {
    let logger = logger.clone();
    tokio::spawn(async move {
        let _ = logger
            .log_with_ack(
                LogLevel::Error,
                Box::new(move |level| Message::event(registry_logger_name(), level, Value::string(text))),
            )
            .await;
    });
}

#[allow(clippy::too_many_arguments)]
async fn run(
    mut control_rx: mpsc::UnboundedReceiver<Control>,
    engine: EngineHandle,
    mut targets: Vec<Entry>,
    mut metrics: Vec<Entry>,
    mut health_checks: Vec<Entry>,
    globals: GlobalsHandle,
    registry_middleware: Middleware,
    default_level: LogLevel,
    runtime_info: RuntimeInfo,
    internal_logger: Arc<dyn Logger>,
    stopped: Arc<AtomicBool>,
) {
    let mut supervise_tick = tokio::time::interval(SUPERVISION_POLL_INTERVAL);
    let (restart_tx, mut restart_rx) = mpsc::unbounded_channel::<RestartOutcome>();

    loop {
        tokio::select! {
            biased;

            Some(ctrl) = control_rx.recv() => match ctrl {
                Control::GetLogger { name, call_site_middleware, reply } => {
                    let middleware = middleware::compose_registry_and_call_site(
                        &registry_middleware,
                        call_site_middleware.as_ref(),
                    );
                    let logger: Arc<dyn Logger> = Arc::new(EngineLogger {
                        name,
                        level: default_level,
                        engine: engine.clone(),
                        middleware,
                    });
                    let _ = reply.send(logger);
                }
                Control::Flush { timeout, reply } => {
                    let services: Vec<(String, Arc<SupervisedService>)> = targets
                        .iter()
                        .map(|e| (e.name.clone(), e.service.clone()))
                        .collect();
                    tokio::spawn(run_flush(services, timeout, reply));
                }
                Control::Shutdown { timeout, reply } => {
                    let health_checks: Vec<_> = health_checks
                        .iter()
                        .map(|e| (e.name.clone(), e.service.clone()))
                        .collect();
                    let metrics: Vec<_> = metrics
                        .iter()
                        .map(|e| (e.name.clone(), e.service.clone()))
                        .collect();
                    let targets: Vec<_> = targets
                        .iter()
                        .map(|e| (e.name.clone(), e.service.clone()))
                        .collect();
                    let engine = engine.clone();
                    let globals = globals.clone();
                    tokio::spawn(async move {
                        let info = run_shutdown(health_checks, metrics, targets, engine, globals, timeout).await;
                        let _ = reply.send(info);
                    });
                    stopped.store(true, Ordering::Release);
                    return;
                }
            },

            _ = supervise_tick.tick() => {
                for group in [&mut targets, &mut metrics, &mut health_checks] {
                    for entry in group.iter_mut() {
                        if entry.restart_pending {
                            continue;
                        }
                        let state = entry.service.state().await;
                        if state.is_faulted() {
                            entry.restart_pending = true;
                            log_error(&internal_logger, format!(
                                "service '{}' faulted: {:?}; restarting in {:?}",
                                entry.name, state, RESTART_DELAY
                            ));
                            let kind = entry.kind;
                            let name = entry.name.clone();
                            let factory = entry.factory.clone();
                            let runtime_info = runtime_info.clone();
                            let restart_tx = restart_tx.clone();
                            tokio::spawn(async move {
                                tokio::time::sleep(RESTART_DELAY).await;
                                let outcome = match factory.create(&runtime_info) {
                                    Ok(sink) => {
                                        let service = SupervisedService::spawn(
                                            Entry::scoped_name(kind, &name).as_dotted(),
                                            sink,
                                        );
                                        RestartOutcome::Ready { kind, name, service }
                                    }
                                    Err(err) => RestartOutcome::Failed {
                                        kind,
                                        name,
                                        factory,
                                        error: err.to_string(),
                                    },
                                };
                                let _ = restart_tx.send(outcome);
                            });
                        }
                    }
                }
            }

            Some(outcome) = restart_rx.recv() => match outcome {
                RestartOutcome::Ready { kind, name, service } => {
                    if kind != ServiceKind::HealthCheck {
                        engine.subscribe(name.clone(), service.as_target_sink());
                    }
                    let group = match kind {
                        ServiceKind::Target => &mut targets,
                        ServiceKind::Metric => &mut metrics,
                        ServiceKind::HealthCheck => &mut health_checks,
                    };
                    if let Some(entry) = group.iter_mut().find(|e| e.name == name) {
                        entry.service = service;
                        entry.restart_pending = false;
                    }
                    log_info(&internal_logger, format!("service '{}' restarted", name));
                }
                RestartOutcome::Failed { kind, name, factory, error } => {
                    log_error(&internal_logger, format!(
                        "service '{}' restart failed: {}; retrying in {:?}", name, error, RESTART_DELAY
                    ));
                    let runtime_info = runtime_info.clone();
                    let restart_tx = restart_tx.clone();
                    tokio::spawn(async move {
                        tokio::time::sleep(RESTART_DELAY).await;
                        let outcome = match factory.create(&runtime_info) {
                            Ok(sink) => {
                                let service = SupervisedService::spawn(
                                    Entry::scoped_name(kind, &name).as_dotted(),
                                    sink,
                                );
                                RestartOutcome::Ready { kind, name, service }
                            }
                            Err(err) => RestartOutcome::Failed {
                                kind,
                                name,
                                factory,
                                error: err.to_string(),
                            },
                        };
                        let _ = restart_tx.send(outcome);
                    });
                }
            },

            else => break,
        }
    }
}

async fn run_flush(
    services: Vec<(String, Arc<SupervisedService>)>,
    timeout: Option<Duration>,
    mut reply: oneshot::Sender<FlushInfo>,
) {
    // Track names directly rather than reading them back off the
    // FuturesUnordered stream: a future that hasn't resolved by the
    // deadline can't hand back the name it closed over without being
    // polled to completion, so "whoever's left in `remaining`" is the
    // only reliable way to know who timed out.
    let mut remaining: std::collections::HashSet<String> =
        services.iter().map(|(name, _)| name.clone()).collect();
    let mut acks = Vec::new();
    let mut timeouts_from_errors = Vec::new();

    let mut pending = FuturesUnordered::new();
    for (name, service) in services {
        pending.push(async move { (name, service.flush().await) });
    }

    let sleep = tokio::time::sleep(timeout.unwrap_or(NO_TIMEOUT_SENTINEL));
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            biased;
            _ = reply.closed() => return,
            _ = &mut sleep => break,
            next = pending.next() => match next {
                Some((name, result)) => {
                    remaining.remove(&name);
                    // A sink that errors on flush didn't successfully ack;
                    // it goes in the same bucket as a timed-out target
                    // since `FlushInfo` has no third "errored" shape.
                    if result.is_ok() {
                        acks.push(name);
                    } else {
                        timeouts_from_errors.push(name);
                    }
                }
                None => break,
            }
        }
    }

    let mut timeouts: Vec<String> = remaining.into_iter().collect();
    timeouts.extend(timeouts_from_errors);
    let _ = reply.send(FlushInfo { acks, timeouts });
}

async fn run_shutdown(
    health_checks: Vec<(String, Arc<SupervisedService>)>,
    metrics: Vec<(String, Arc<SupervisedService>)>,
    targets: Vec<(String, Arc<SupervisedService>)>,
    engine: EngineHandle,
    globals: GlobalsHandle,
    timeout: Option<Duration>,
) -> ShutdownInfo {
    let deadline = timeout.map(|d| Instant::now() + d);
    let mut acks = Vec::new();
    let mut timeouts = Vec::new();

    // Reverse dependency order: health checks, then metrics, then targets,
    // then the engine itself, then globals (§4.4 "Shutdown").
    for group in [health_checks, metrics, targets] {
        let mut pending = FuturesUnordered::new();
        for (name, service) in group {
            let per_service_timeout = deadline.map(|dl| dl.saturating_duration_since(Instant::now()));
            pending.push(async move { (name, service.shutdown(per_service_timeout).await) });
        }
        while let Some((name, result)) = pending.next().await {
            match result {
                Ok(()) => acks.push(name),
                Err(_) => timeouts.push(name),
            }
        }
    }

    engine.shutdown().await;
    acks.push("Engine".to_string());

    match globals.shutdown().await {
        Ok(()) => acks.push("Globals".to_string()),
        Err(_) => timeouts.push("Globals".to_string()),
    }

    ShutdownInfo { acks, timeouts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logary_core::{Clock, SystemClock, TargetConf};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct BootstrapLogger;

    #[async_trait::async_trait]
    impl Logger for BootstrapLogger {
        fn name(&self) -> &PointName {
            unimplemented!()
        }
        fn level(&self) -> LogLevel {
            LogLevel::Fatal
        }
        fn log(&self, _level: LogLevel, _factory: MessageFactory) -> Result<CommitAck, LogaryError> {
            Ok(CommitAck::Committed)
        }
        async fn log_with_ack(
            &self,
            _level: LogLevel,
            _factory: MessageFactory,
        ) -> Result<Ack, LogaryError> {
            Ok(Ack)
        }
    }

    struct MemorySink(Arc<Mutex<Vec<Message>>>);

    #[async_trait::async_trait]
    impl TargetSink for MemorySink {
        async fn send(&self, message: Message) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(message);
            Ok(())
        }
    }

    // A logger's ack resolves on acceptance by the engine, before any
    // target has necessarily written the message (§4.1) — delivery happens
    // on that target's own worker task, so tests poll briefly rather than
    // assume it's visible the instant the ack future resolves.
    async fn wait_for_len(received: &Mutex<Vec<Message>>, expected: usize) {
        for _ in 0..100 {
            if received.lock().unwrap().len() >= expected {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {expected} delivered messages, got {}", received.lock().unwrap().len());
    }

    fn bootstrap_runtime_info() -> RuntimeInfo {
        RuntimeInfo::new(
            "svc",
            "host",
            Arc::new(SystemClock) as Arc<dyn Clock>,
            Arc::new(BootstrapLogger) as Arc<dyn Logger>,
        )
    }

    #[tokio::test]
    async fn get_logger_delivers_to_registered_target() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink_store = received.clone();
        let conf = LogaryConf::new(bootstrap_runtime_info()).with_target(TargetConf::new(
            "console",
            move |_: &RuntimeInfo| Ok(Box::new(MemorySink(sink_store.clone())) as Box<dyn TargetSink>),
        ));

        let registry = RegistryHandle::create(conf).unwrap();
        let logger = registry.get_logger(PointName::new(["app"])).await.unwrap();
        logger
            .log_with_ack(LogLevel::Info, Box::new(|level| {
                Message::event(PointName::new(["app"]), level, Value::string("hi"))
                    .with_target("console")
            }))
            .await
            .unwrap();

        wait_for_len(&received, 1).await;
        assert_eq!(received.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn flush_reports_target_acks() {
        let conf = LogaryConf::new(bootstrap_runtime_info()).with_target(TargetConf::new(
            "console",
            |_: &RuntimeInfo| Ok(Box::new(MemorySink(Default::default())) as Box<dyn TargetSink>),
        ));
        let registry = RegistryHandle::create(conf).unwrap();
        let info = registry.flush(Some(Duration::from_secs(1))).await.unwrap();
        assert_eq!(info.acks, vec!["console".to_string()]);
        assert!(info.timeouts.is_empty());
    }

    struct FaultingFlushSink;

    #[async_trait::async_trait]
    impl TargetSink for FaultingFlushSink {
        async fn send(&self, _message: Message) -> anyhow::Result<()> {
            Ok(())
        }
        async fn flush(&self) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }
    }

    #[tokio::test]
    async fn flush_reports_a_failed_target_as_timed_out_not_acked() {
        let conf = LogaryConf::new(bootstrap_runtime_info()).with_target(TargetConf::new(
            "console",
            |_: &RuntimeInfo| Ok(Box::new(FaultingFlushSink) as Box<dyn TargetSink>),
        ));
        let registry = RegistryHandle::create(conf).unwrap();
        let info = registry.flush(Some(Duration::from_secs(1))).await.unwrap();
        assert!(info.acks.is_empty());
        assert_eq!(info.timeouts, vec!["console".to_string()]);
    }

    #[tokio::test]
    async fn shutdown_is_terminal() {
        let conf = LogaryConf::new(bootstrap_runtime_info());
        let registry = RegistryHandle::create(conf).unwrap();
        let (_, shutdown_info) = registry
            .shutdown(Some(Duration::from_secs(1)), Some(Duration::from_secs(1)))
            .await
            .unwrap();
        assert!(shutdown_info.acks.contains(&"Engine".to_string()));

        let err = registry.get_logger(PointName::new(["x"])).await.unwrap_err();
        assert_eq!(err, LogaryError::Stopped);
    }

    #[tokio::test]
    async fn duplicate_target_names_are_rejected_at_create() {
        let conf = LogaryConf::new(bootstrap_runtime_info())
            .with_target(TargetConf::new("console", |_: &RuntimeInfo| {
                Ok(Box::new(MemorySink(Default::default())) as Box<dyn TargetSink>)
            }))
            .with_target(TargetConf::new("console", |_: &RuntimeInfo| {
                Ok(Box::new(MemorySink(Default::default())) as Box<dyn TargetSink>)
            }));
        let err = RegistryHandle::create(conf).unwrap_err();
        assert!(matches!(err, LogaryError::Configuration(_)));
    }
}
