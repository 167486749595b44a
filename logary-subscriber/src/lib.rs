#![warn(missing_docs, unreachable_pub)]

//! The actor runtime backing `logary`.
//!
//! [`logary_core`] defines the stable data model and capability traits;
//! this crate supplies the concrete tokio-based machinery that makes them
//! run: the message-routing [`engine::EngineHandle`], the
//! [`supervised::SupervisedService`] wrapper every target/metric/health
//! check is spawned into, the [`globals::GlobalsHandle`] process-wide
//! configuration cell, and the [`registry::RegistryHandle`] composition
//! root that ties them together from a [`conf::LogaryConf`].

pub mod conf;
pub mod engine;
pub mod globals;
pub mod middleware;
pub mod promised_logger;
pub mod registry;
pub mod supervised;

pub use conf::LogaryConf;
pub use engine::{EngineHandle, DEFAULT_INGRESS_CAPACITY};
pub use globals::{get_logger as global_get_logger, GlobalConfig, GlobalsHandle};
pub use middleware::Middleware;
pub use promised_logger::{PromisedLogger, DEFAULT_BUFFER_CAPACITY};
pub use registry::RegistryHandle;
pub use supervised::SupervisedService;
