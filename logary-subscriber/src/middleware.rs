//! Composable `Message -> Message` transforms attached to a logger at the
//! registry level, at the call site, or both (§4.4 "getLogger").

use std::sync::Arc;

use logary_core::Message;

/// A synchronous message transform. Applied to the message a
/// [`logary_core::MessageFactory`] produces, before the message reaches the
/// engine's processing function.
pub type Middleware = Arc<dyn Fn(Message) -> Message + Send + Sync>;

/// Builds a no-op middleware.
pub fn identity() -> Middleware {
    Arc::new(|m| m)
}

/// Composes `outer` after `inner`: `compose(outer, inner)(m) == outer(inner(m))`.
pub fn compose(outer: Middleware, inner: Middleware) -> Middleware {
    Arc::new(move |m| outer(inner(m)))
}

/// Folds a list of middleware into one, applied left to right: the first
/// entry transforms the raw message first, the last entry sees its output.
pub fn chain(stages: Vec<Middleware>) -> Middleware {
    stages
        .into_iter()
        .fold(identity(), |acc, stage| compose(stage, acc))
}

/// Composes registry-level middleware with call-site middleware, in the
/// order documented in §4.4: "registry middleware ∘ call-site middleware" —
/// registry stages see the raw message first, the call-site stage runs last
/// and sees the registry-transformed message.
pub fn compose_registry_and_call_site(
    registry: &Middleware,
    call_site: Option<&Middleware>,
) -> Middleware {
    match call_site {
        Some(cs) => compose(cs.clone(), registry.clone()),
        None => registry.clone(),
    }
}
