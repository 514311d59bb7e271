//! The pending-lookup table for forward references.
//!
//! When a type renders with a relationship whose target is not registered
//! yet, the edge is recorded unresolved and an [`Obligation`] is queued
//! under the target's key. Registering that key later drains its queue
//! and back-fills the consumers' edges. Entries are keyed and iterated in
//! insertion order.

use indexmap::IndexMap;
use kiln_core::ModelKey;

/// A deferred edge fix-up: `consumer.field` awaits some target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Obligation {
    /// The type holding the dangling edge.
    pub consumer: ModelKey,
    /// The field declaring it.
    pub field: String,
}

impl Obligation {
    /// An obligation for `consumer`'s field `field`.
    pub fn new(consumer: ModelKey, field: impl Into<String>) -> Self {
        Self {
            consumer,
            field: field.into(),
        }
    }
}

/// Target-keyed queues of deferred edge fix-ups.
#[derive(Clone, Debug, Default)]
pub struct PendingLookups {
    entries: IndexMap<ModelKey, Vec<Obligation>>,
}

impl PendingLookups {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an obligation under `target`. Identical obligations for the
    /// same target collapse to one.
    pub fn defer(&mut self, target: ModelKey, obligation: Obligation) {
        let queue = self.entries.entry(target).or_default();
        if !queue.contains(&obligation) {
            queue.push(obligation);
        }
    }

    /// Remove and return every obligation queued under `target`.
    pub fn take(&mut self, target: &ModelKey) -> Vec<Obligation> {
        self.entries.shift_remove(target).unwrap_or_default()
    }

    /// Obligations queued under `target`, without removing them.
    pub fn obligations_for(&self, target: &ModelKey) -> &[Obligation] {
        self.entries
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drop every obligation whose consumer is `consumer`.
    ///
    /// Used when a type unregisters: its re-render will re-queue whatever
    /// is still dangling, and stale entries must not accumulate.
    pub fn purge_consumer(&mut self, consumer: &ModelKey) {
        self.entries.retain(|_, queue| {
            queue.retain(|obligation| obligation.consumer != *consumer);
            !queue.is_empty()
        });
    }

    /// Keys with at least one queued obligation, in insertion order.
    pub fn targets(&self) -> impl Iterator<Item = &ModelKey> {
        self.entries.keys()
    }

    /// Number of keys with queued obligations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no obligations are queued at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
