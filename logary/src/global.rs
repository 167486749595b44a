//! The process-wide facade (§4.5): resolves loggers against whatever
//! [`logary_core::RuntimeInfo`]-bearing [`crate::LogManager`] most recently
//! installed itself, without threading a handle through every call site.
//!
//! A [`crate::LogManager`] installs its loggers globally the moment it is
//! created; nothing here needs to be started explicitly.

use std::sync::Arc;

use logary_core::{Logger, PointName};

/// Resolves `name` against the currently installed global configuration, if
/// any manager has been created yet.
pub fn get_logger(name: &PointName) -> Option<Arc<dyn Logger>> {
    logary_subscriber::global_get_logger(name)
}
