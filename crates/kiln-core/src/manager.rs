//! The manager side of the reconstruction protocol.
//!
//! Managers are helper objects attached to a type by name. Descriptions
//! carry them as shared immutable instances; the protocol contract mirrors
//! fields: decompose to a tagged recipe, rebuild through a catalog.

use indexmap::IndexMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::value::Value;

/// A portable recipe for rebuilding a manager.
///
/// Same record shape as [`FieldParts`](crate::FieldParts); kept as its own
/// type so field and manager builders cannot be crossed by accident.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManagerParts {
    /// Builder tag.
    pub tag: String,
    /// Positional constructor arguments.
    pub args: Vec<Value>,
    /// Named constructor arguments.
    pub kwargs: IndexMap<String, Value>,
}

impl ManagerParts {
    /// Parts with the given tag and no arguments.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            args: Vec::new(),
            kwargs: IndexMap::new(),
        }
    }

    /// Append a positional argument.
    pub fn with_arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Insert a named argument.
    pub fn with_kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

/// Counter backing [`next_creation_seq`].
static CREATION_SEQ_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Allocate the next manager attachment-order number.
///
/// Each call returns a value greater than every previous one within this
/// process. Thread-safe. Manager implementations call this once at
/// construction and return the stored value from
/// [`SchemaManager::creation_seq`].
pub fn next_creation_seq() -> u64 {
    CREATION_SEQ_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A helper object attachable to a type, decomposable for rebuilding.
///
/// Instances are immutable once constructed; descriptions and clones share
/// them by reference, which is safe precisely because nothing can mutate
/// them afterwards.
pub trait SchemaManager: fmt::Debug + Send + Sync {
    /// The portable recipe for this manager.
    fn decompose(&self) -> ManagerParts;

    /// Global attachment order, from [`next_creation_seq`].
    ///
    /// Determines which manager is a type's default (lowest wins) and the
    /// order managers are carried in when importing from a live type.
    fn creation_seq(&self) -> u64;

    /// Whether snapshots should carry this manager at all.
    ///
    /// Defaults to `false`: plain helper objects are noise in a schema
    /// history, so managers opt in explicitly.
    fn in_migrations(&self) -> bool {
        false
    }
}
