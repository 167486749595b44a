use std::sync::Arc;

use async_trait::async_trait;

use crate::{message::Message, RuntimeInfo};

/// The interface a concrete sink (a Target, or — structurally identical per
/// the glossary — a Metric) must implement to be wrapped in a supervised
/// [`crate::Service`] by the registry.
///
/// Concrete implementations (writing to Elasticsearch, a file, stdout, ...)
/// are explicitly out of scope for this crate (§1); this trait is the
/// contract target implementers build against.
#[async_trait]
pub trait TargetSink: Send + Sync {
    /// Delivers one message. Errors here fault the owning service; they do
    /// not crash the engine (§7).
    async fn send(&self, message: Message) -> anyhow::Result<()>;

    /// Best-effort flush of any buffered state. Default no-op for sinks that
    /// write through immediately.
    async fn flush(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Drains and releases any held resources. Called once, during
    /// shutdown, after a best-effort `flush`.
    async fn shutdown(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Constructs a running [`TargetSink`] given the process's [`RuntimeInfo`].
///
/// Kept as a narrow trait (rather than a plain closure) so factories can
/// carry their own configuration state and so trait objects
/// (`Arc<dyn TargetFactory>`) can be stored uniformly in `LogaryConf`.
pub trait TargetFactory: Send + Sync {
    /// Builds the sink. Called once per registry creation (and again, after
    /// the supervisor's restart delay, if the resulting service faults).
    fn create(&self, runtime_info: &RuntimeInfo) -> anyhow::Result<Box<dyn TargetSink>>;
}

impl<F> TargetFactory for F
where
    F: Fn(&RuntimeInfo) -> anyhow::Result<Box<dyn TargetSink>> + Send + Sync,
{
    fn create(&self, runtime_info: &RuntimeInfo) -> anyhow::Result<Box<dyn TargetSink>> {
        self(runtime_info)
    }
}

/// Which role a [`ServiceConf`]-shaped entry plays in the registry. Metrics
/// are structurally identical to targets (they can be registered as engine
/// subscribers); health checks are supervised like any other service but
/// are never engine subscribers (they don't consume routed messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// A named message sink, addressable from the processing pipeline via
    /// the `"target"` context key.
    Target,
    /// Structurally identical to a `Target`.
    Metric,
    /// A periodic probe; supervised, but not an engine subscriber.
    HealthCheck,
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ServiceKind::Target => "Target",
            ServiceKind::Metric => "Metric",
            ServiceKind::HealthCheck => "HealthCheck",
        })
    }
}

macro_rules! service_conf {
    ($name:ident, $kind:expr, $doc:expr) => {
        #[doc = $doc]
        pub struct $name {
            pub(crate) name: String,
            pub(crate) factory: Arc<dyn TargetFactory>,
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("name", &self.name)
                    .finish_non_exhaustive()
            }
        }

        impl $name {
            /// Names this configuration entry and binds the factory that
            /// will construct its running sink.
            pub fn new(name: impl Into<String>, factory: impl TargetFactory + 'static) -> Self {
                $name {
                    name: name.into(),
                    factory: Arc::new(factory),
                }
            }

            /// The configured name.
            pub fn name(&self) -> &str {
                &self.name
            }

            /// The factory that builds this entry's running sink.
            pub fn factory(&self) -> &Arc<dyn TargetFactory> {
                &self.factory
            }

            /// Which role this entry plays in the registry (§4.4 step 2's
            /// `"{Kind}({name})"` internal logger naming).
            pub fn kind(&self) -> ServiceKind {
                $kind
            }
        }
    };
}

service_conf!(
    TargetConf,
    ServiceKind::Target,
    "Configuration for a named target: a sink plus the factory that builds it."
);
service_conf!(
    MetricConf,
    ServiceKind::Metric,
    "Configuration for a named metric sink. Structurally identical to a \
     `TargetConf` (§ Glossary)."
);
service_conf!(
    HealthCheckConf,
    ServiceKind::HealthCheck,
    "Configuration for a named health check: a periodic probe, supervised \
     like any other service but never an engine subscriber."
);
