//! Declarative logging macros.
//!
//! Each level macro takes a logger expression, a message, and zero or more
//! `key => value` context pairs, and forwards to [`logary_core::Logger::log`]
//! — the non-blocking call that returns a [`logary_core::CommitAck`] (or
//! drops the message under backpressure) without waiting on the engine.
//! Append `_ack` to the macro name (`info_ack!`, `error_ack!`, ...) for the
//! awaited [`logary_core::Logger::log_with_ack`] form.
//!
//! The message factory these macros build is only ever invoked if the
//! logger actually admits the level, matching the laziness
//! [`logary_core::Logger`] documents.

/// Shared expansion every level macro (and its `_ack` sibling) delegates to.
/// Not part of the public macro surface; use the level macros instead.
#[doc(hidden)]
#[macro_export]
macro_rules! __log_factory {
    ($logger:expr, $msg:expr $(, $key:expr => $val:expr)* $(,)?) => {{
        let name = $crate::Logger::name(&*$logger).clone();
        ::std::boxed::Box::new(move |level: $crate::LogLevel| {
            #[allow(unused_mut)]
            let mut message = $crate::Message::event(name, level, $crate::Value::string($msg));
            $( message = message.with_context($key, $val); )*
            message
        }) as $crate::MessageFactory
    }};
}

macro_rules! level_macro {
    ($name:ident, $ack_name:ident, $level:expr, $doc:expr) => {
        level_macro!(@inner $name, $ack_name, $level, $doc, $);
    };
    (@inner $name:ident, $ack_name:ident, $level:expr, $doc:expr, $d:tt) => {
        #[doc = $doc]
        #[macro_export]
        macro_rules! $name {
            ($d logger:expr, $d msg:expr $d(, $d key:expr => $d val:expr)* $d(,)?) => {
                $crate::Logger::log(
                    &*$d logger,
                    $level,
                    $crate::__log_factory!($d logger, $d msg $d(, $d key => $d val)*),
                )
            };
        }

        #[doc = $doc]
        /// Awaits engine acknowledgement instead of returning immediately.
        #[macro_export]
        macro_rules! $ack_name {
            ($d logger:expr, $d msg:expr $d(, $d key:expr => $d val:expr)* $d(,)?) => {
                $crate::Logger::log_with_ack(
                    &*$d logger,
                    $level,
                    $crate::__log_factory!($d logger, $d msg $d(, $d key => $d val)*),
                )
            };
        }
    };
}

level_macro!(
    trace,
    trace_ack,
    crate::LogLevel::Verbose,
    "Logs at the finest-grained diagnostic level."
);
level_macro!(
    debug,
    debug_ack,
    crate::LogLevel::Debug,
    "Logs at debug level."
);
level_macro!(
    info,
    info_ack,
    crate::LogLevel::Info,
    "Logs at info level."
);
level_macro!(
    warn,
    warn_ack,
    crate::LogLevel::Warn,
    "Logs at warn level."
);
level_macro!(
    error,
    error_ack,
    crate::LogLevel::Error,
    "Logs at error level."
);
level_macro!(
    fatal,
    fatal_ack,
    crate::LogLevel::Fatal,
    "Logs at fatal level."
);

/// Starts a [`logary_core::Span`] against a logger, clock, and id generator.
/// Add `parent: $parent_id` to start it as a child of an existing id
/// instead of a root span.
#[macro_export]
macro_rules! span {
    ($logger:expr, $clock:expr, $id_gen:expr) => {
        $crate::Span::root($logger, $clock, $id_gen)
    };
    ($logger:expr, $clock:expr, $id_gen:expr, parent: $parent:expr) => {
        $crate::Span::child_of($parent, $logger, $clock, $id_gen)
    };
}
