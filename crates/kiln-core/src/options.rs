//! Per-type option settings carried by descriptions and rendered types.
//!
//! Options are a closed, typed set rather than a free-form map: every
//! semantically equal configuration has exactly one representation, so
//! description equality can compare options structurally.

use std::collections::BTreeSet;

/// Settings attached to a described type.
///
/// The constraint collections (`unique_sets`, `index_sets`) are stored in
/// canonical form: a set of field-name sets. Any iteration order of the
/// declared groups, or of the names within a group, produces the same
/// value. Use [`ModelOptions::normalize_field_sets`] to canonicalize
/// caller input.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ModelOptions {
    /// Explicit storage-table name, if the type overrides the derived one.
    pub table_name: Option<String>,
    /// Whether the type is abstract: it renders only as a base for others
    /// and importing flattens it away.
    pub is_abstract: bool,
    /// Groups of field names that must be jointly unique.
    pub unique_sets: BTreeSet<BTreeSet<String>>,
    /// Groups of field names indexed together.
    pub index_sets: BTreeSet<BTreeSet<String>>,
    /// Field this type keeps an explicit per-relation ordering for.
    ///
    /// Rendering materializes a synthetic ordinal field when set.
    pub order_with_field: Option<String>,
}

impl ModelOptions {
    /// Canonicalize nested field-name groups.
    ///
    /// Accepts any iterable of iterables of names; duplicate groups and
    /// duplicate names within a group collapse.
    pub fn normalize_field_sets<G, N, S>(groups: G) -> BTreeSet<BTreeSet<String>>
    where
        G: IntoIterator<Item = N>,
        N: IntoIterator<Item = S>,
        S: Into<String>,
    {
        groups
            .into_iter()
            .map(|group| group.into_iter().map(Into::into).collect())
            .collect()
    }

    /// Drop every option that names fields by listing them.
    ///
    /// Used when importing a type with its relationships stripped: the
    /// constraint groups and the ordering marker may reference fields the
    /// stripped description no longer has.
    pub fn strip_field_listings(&mut self) {
        self.unique_sets.clear();
        self.index_sets.clear();
        self.order_with_field = None;
    }
}
