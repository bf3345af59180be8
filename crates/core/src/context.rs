//! Per-request correlation context.
//!
//! [`ContextPropagator`] carries correlation identifiers across the
//! dependent calls of one logical request, purely for tracing. It is
//! an owned, cloneable handle: clones share one map, two independently
//! constructed propagators share nothing. Binding one propagator per
//! request keeps context from leaking between concurrently executing
//! requests; there is no process-wide instance.
//!
//! The context is never persisted and never influences repository
//! behavior. It only decorates log emissions.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Namespace prefix applied to every context key.
pub const CORRELATION_PREFIX: &str = "x-correlation-";

/// Snapshot of the ambient correlation map.
pub type ContextMap = BTreeMap<String, String>;

/// Invocation-scoped correlation context.
#[derive(Debug, Clone, Default)]
pub struct ContextPropagator {
    entries: Arc<RwLock<ContextMap>>,
}

impl ContextPropagator {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a correlation entry. The key is namespaced under
    /// [`CORRELATION_PREFIX`] unless it already carries it.
    pub fn set(&self, key: &str, value: impl Into<String>) {
        let key = if key.starts_with(CORRELATION_PREFIX) {
            key.to_string()
        } else {
            format!("{}{}", CORRELATION_PREFIX, key)
        };
        self.entries.write().insert(key, value.into());
    }

    /// Snapshot of the current context, empty if nothing was set.
    pub fn get(&self) -> ContextMap {
        self.entries.read().clone()
    }

    /// Atomically replace the whole context. Used at request-boundary
    /// entry when inbound correlation headers arrive.
    pub fn replace_all_with(&self, context: ContextMap) {
        *self.entries.write() = context;
    }

    /// Reset the context. Used at request-boundary entry and exit.
    pub fn clear_all(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_set_namespaces_keys() {
        let ctx = ContextPropagator::new();
        ctx.set("request-id", "r-1");
        ctx.set("x-correlation-trace-id", "t-1");

        let snapshot = ctx.get();
        assert_eq!(
            snapshot.get("x-correlation-request-id").map(String::as_str),
            Some("r-1")
        );
        // Already-prefixed keys are not double-prefixed.
        assert_eq!(
            snapshot.get("x-correlation-trace-id").map(String::as_str),
            Some("t-1")
        );
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_get_is_empty_by_default() {
        assert!(ContextPropagator::new().get().is_empty());
    }

    #[test]
    fn test_replace_and_clear() {
        let ctx = ContextPropagator::new();
        ctx.set("request-id", "r-1");

        let mut inbound = ContextMap::new();
        inbound.insert("x-correlation-session".to_string(), "s-9".to_string());
        ctx.replace_all_with(inbound);

        let snapshot = ctx.get();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key("x-correlation-session"));

        ctx.clear_all();
        assert!(ctx.get().is_empty());
    }

    #[test]
    fn test_clones_share_one_map() {
        let ctx = ContextPropagator::new();
        let handle = ctx.clone();
        handle.set("request-id", "r-1");
        assert_eq!(ctx.get().len(), 1);
    }

    #[test]
    fn test_independent_requests_do_not_leak() {
        // Two concurrent logical requests, each with its own propagator.
        let a = ContextPropagator::new();
        let b = ContextPropagator::new();

        let ta = {
            let a = a.clone();
            thread::spawn(move || a.set("request-id", "req-a"))
        };
        let tb = {
            let b = b.clone();
            thread::spawn(move || b.set("request-id", "req-b"))
        };
        ta.join().unwrap();
        tb.join().unwrap();

        assert_eq!(
            a.get().get("x-correlation-request-id").map(String::as_str),
            Some("req-a")
        );
        assert_eq!(
            b.get().get("x-correlation-request-id").map(String::as_str),
            Some("req-b")
        );
    }
}
