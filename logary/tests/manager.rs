//! Exercises [`LogManager`] itself end to end — create, resolve a logger,
//! emit through it, flush, shut down — rather than its delegated-to
//! `RegistryHandle` pieces, which are covered in `logary-subscriber`.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use logary::{LogManager, LogaryConf, Message, PointName, RuntimeInfo, SystemClock, TargetConf, TargetSink};

struct MemorySink(Arc<Mutex<Vec<Message>>>);

#[async_trait]
impl TargetSink for MemorySink {
    async fn send(&self, message: Message) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(message);
        Ok(())
    }
}

#[derive(Debug)]
struct BootstrapLogger;

#[async_trait]
impl logary::Logger for BootstrapLogger {
    fn name(&self) -> &PointName {
        unimplemented!("only used to bootstrap RuntimeInfo")
    }
    fn level(&self) -> logary::LogLevel {
        logary::LogLevel::Fatal
    }
    fn log(
        &self,
        _level: logary::LogLevel,
        _factory: logary::MessageFactory,
    ) -> Result<logary::CommitAck, logary::LogaryError> {
        Ok(logary::CommitAck::Committed)
    }
    async fn log_with_ack(
        &self,
        _level: logary::LogLevel,
        _factory: logary::MessageFactory,
    ) -> Result<logary::Ack, logary::LogaryError> {
        Ok(logary::Ack)
    }
}

#[tokio::test]
async fn create_resolve_emit_flush_and_shutdown() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink_store = received.clone();
    let runtime_info = RuntimeInfo::new(
        "orders-api",
        "host",
        Arc::new(SystemClock) as Arc<dyn logary::Clock>,
        Arc::new(BootstrapLogger) as Arc<dyn logary::Logger>,
    );
    let conf = LogaryConf::new(runtime_info).with_target(TargetConf::new(
        "mem",
        move |_: &RuntimeInfo| Ok(Box::new(MemorySink(sink_store.clone())) as Box<dyn TargetSink>),
    ));

    let manager = LogManager::create(conf).unwrap();
    assert_eq!(manager.runtime_info().service, "orders-api");

    let name = PointName::new(["app", "job"]);
    let logger = manager.get_logger(name.clone()).await.unwrap();
    logger
        .log_with_ack(
            logary::LogLevel::Info,
            Box::new(move |level| {
                Message::event(name, level, logary::Value::string("started")).with_target("mem")
            }),
        )
        .await
        .unwrap();

    // The ack above resolves on acceptance by the engine, before the
    // target's own worker task has necessarily run (§4.1); wait for actual
    // delivery before flushing so flush's report isn't racing the write.
    for _ in 0..100 {
        if !received.lock().unwrap().is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }

    let flush_info = manager.flush_pending(None).await.unwrap();
    assert_eq!(flush_info.acks, vec!["mem".to_string()]);
    assert_eq!(received.lock().unwrap().len(), 1);

    manager.shutdown(None, None).await.unwrap();
    let resolved = manager.get_logger(PointName::new(["app", "job"])).await;
    assert!(matches!(resolved, Err(logary::LogaryError::Stopped)));
}
