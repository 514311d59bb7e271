//! The field side of the reconstruction protocol.
//!
//! A schema field is any object that can decompose itself into a portable
//! recipe — a tag plus plain-data arguments — from which an equivalent
//! field can be rebuilt through a [`SchemaCatalog`](crate::SchemaCatalog).
//! Every deep copy and every render in the engine goes through that
//! round trip, so the protocol is the load-bearing path, not an export
//! convenience.

use indexmap::IndexMap;
use std::fmt;

use crate::id::ModelKey;
use crate::value::Value;

/// A portable recipe for rebuilding a field.
///
/// `tag` selects the builder in a catalog; `args` and `kwargs` are the
/// positional and named constructor arguments. Two fields are considered
/// interchangeable exactly when their parts compare equal (named-argument
/// order does not participate).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldParts {
    /// Builder tag, e.g. `"text"` or `"fk"`.
    pub tag: String,
    /// Positional constructor arguments.
    pub args: Vec<Value>,
    /// Named constructor arguments.
    pub kwargs: IndexMap<String, Value>,
}

impl FieldParts {
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

/// What kind of cross-type relationship a field declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Many-to-one reference to another type.
    ForeignKey,
    /// One-to-one reference to another type.
    OneToOne,
    /// Many-to-many association with another type.
    ManyToMany,
}

impl RelationKind {
    /// Whether this is a many-to-many association.
    pub fn is_many_to_many(self) -> bool {
        matches!(self, Self::ManyToMany)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForeignKey => write!(f, "foreign key"),
            Self::OneToOne => write!(f, "one-to-one"),
            Self::ManyToMany => write!(f, "many-to-many"),
        }
    }
}

/// The referenced side of a relationship, as declared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelationTarget {
    /// A reference to another type by key.
    Model(ModelKey),
    /// A reference to the owning type itself.
    SelfRef,
}

/// A relationship declared by a field.
///
/// Targets are declared by key (or as a self-reference), never by holding
/// the target object: resolution to a concrete type happens at render
/// time inside a registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relation {
    /// The referenced type.
    pub target: RelationTarget,
    /// The shape of the relationship.
    pub kind: RelationKind,
}

impl Relation {
    /// A relation of `kind` pointing at `target`.
    pub fn new(target: RelationTarget, kind: RelationKind) -> Self {
        Self { target, kind }
    }

    /// A relation of `kind` pointing back at the owning type.
    pub fn self_ref(kind: RelationKind) -> Self {
        Self {
            target: RelationTarget::SelfRef,
            kind,
        }
    }
}

/// A field blueprint that can decompose itself for rebuilding.
///
/// Contract: `decompose` must be faithful — rebuilding the returned parts
/// through a catalog that knows the tag must produce a field whose own
/// decomposition is equal. Parts must be plain data only; a field that
/// sneaks a live-type reference into its parts breaks clone isolation.
pub trait SchemaField: fmt::Debug + Send + Sync {
    /// The portable recipe for this field.
    fn decompose(&self) -> FieldParts;

    /// The relationship this field declares, if any.
    ///
    /// Scalar fields return `None` (the default).
    fn relation(&self) -> Option<Relation> {
        None
    }
}
