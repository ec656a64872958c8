//! Concurrent flow-id → span registry.
//!
//! Many worker threads race on this map: different flows creating their
//! spans concurrently, and the first traced operation of a single flow
//! potentially racing with itself across resumptions. Creation must run
//! exactly once per identity, and unrelated identities must not contend on
//! a shared lock, so the registry is a sharded map with per-entry locking
//! rather than a `RwLock<HashMap>`.

use dashmap::DashMap;

use crate::flow::FlowId;

/// Concurrent mapping from flow identity to its active span handle.
///
/// A flow that never signals completion keeps its entry (and its unfinished
/// backend span) alive for the life of the process; there is no time-based
/// eviction. Lifecycle discipline belongs to the caller: every flow that
/// begins tracing must eventually be ended.
#[derive(Debug)]
pub struct SpanRegistry<S> {
    entries: DashMap<FlowId, S>,
}

impl<S: Clone> SpanRegistry<S> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Return the span for `id`, creating it with `create` if absent.
    ///
    /// `create` runs exactly once per identity even when concurrent callers
    /// race on the same id: the entry's shard stays locked for the duration
    /// of the closure. `create` must therefore not touch this registry.
    pub fn get_or_create(&self, id: &FlowId, create: impl FnOnce() -> S) -> S {
        self.entries
            .entry(id.clone())
            .or_insert_with(create)
            .clone()
    }

    /// Atomically remove and return the span for `id`, if present.
    ///
    /// The caller is responsible for finishing the returned span.
    pub fn remove(&self, id: &FlowId) -> Option<S> {
        self.entries.remove(id).map(|(_, span)| span)
    }

    /// Whether a live entry exists for `id`.
    pub fn contains(&self, id: &FlowId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Clone> Default for SpanRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
