//! Rendered types: the concrete artifacts a registry produces.
//!
//! A rendered type is a tagged record, not generated code: an ordered
//! field table whose relation targets have been resolved to keys, plus
//! the options, base handles, and manager instances the description
//! declared. Registries address rendered types by key; the records
//! themselves never embed other rendered types.

use crate::field::{RelationKind, SchemaField};
use crate::id::ModelKey;
use crate::model::{BaseRef, ManagerDecl};
use crate::options::ModelOptions;

/// A resolved (or provisionally unresolved) relationship edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelationEdge {
    /// The referenced type's key. Self-references are normalized to the
    /// owning type's key at render time.
    pub target: ModelKey,
    /// The shape of the relationship.
    pub kind: RelationKind,
    /// Whether the target was present when this edge was rendered, or has
    /// been back-filled since. An unresolved edge has a matching entry in
    /// the registry's pending-lookup table.
    pub resolved: bool,
}

/// One field slot in a rendered type.
#[derive(Debug)]
pub struct RenderedField {
    /// Field name.
    pub name: String,
    /// The reconstructed field object.
    pub schema: Box<dyn SchemaField>,
    /// Relationship edge, if the field declares one.
    pub relation: Option<RelationEdge>,
    /// Whether the engine materialized this field (the ordinal slot for
    /// types with an ordering option). Importing skips synthetic fields.
    pub synthetic: bool,
}

impl RenderedField {
    /// A plain rendered field with no relation and no synthetic marker.
    pub fn scalar(name: impl Into<String>, schema: Box<dyn SchemaField>) -> Self {
        Self {
            name: name.into(),
            schema,
            relation: None,
            synthetic: false,
        }
    }
}

/// A concrete, registry-resident type.
#[derive(Debug)]
pub struct RenderedModel {
    /// Owning group label.
    pub group: String,
    /// Display-cased type name.
    pub name: String,
    /// Ordered field table.
    pub fields: Vec<RenderedField>,
    /// Option settings at render time.
    pub options: ModelOptions,
    /// Base chain as key handles; `Model` entries were present in the
    /// registry when this type rendered.
    pub bases: Vec<BaseRef>,
    /// Attached manager instances.
    pub managers: Vec<ManagerDecl>,
}

impl RenderedModel {
    /// The identity key: `(group, lowercased name)`.
    pub fn key(&self) -> ModelKey {
        ModelKey::new(&self.group, &self.name)
    }

    /// Look up a field slot by exact name.
    pub fn field_by_name(&self, name: &str) -> Option<&RenderedField> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Mutable field-slot lookup, used to back-fill resolved edges.
    pub fn field_by_name_mut(&mut self, name: &str) -> Option<&mut RenderedField> {
        self.fields.iter_mut().find(|field| field.name == name)
    }

    /// Every relationship edge, paired with its field name.
    pub fn relation_edges(&self) -> impl Iterator<Item = (&str, &RelationEdge)> {
        self.fields
            .iter()
            .filter_map(|field| field.relation.as_ref().map(|edge| (field.name.as_str(), edge)))
    }

    /// Keys of many-to-many targets, deduplicated, in field order.
    pub fn m2m_targets(&self) -> Vec<ModelKey> {
        let mut targets = Vec::new();
        for (_, edge) in self.relation_edges() {
            if edge.kind.is_many_to_many() && !targets.contains(&edge.target) {
                targets.push(edge.target.clone());
            }
        }
        targets
    }
}
