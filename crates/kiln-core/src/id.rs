//! The [`ModelKey`] identity type.

use std::fmt;

/// Identifies a described or rendered type within a project.
///
/// Identity is the pair `(group, lowercased name)`: lookups are
/// case-insensitive on the type name, so `("shop", "Order")` and
/// `("shop", "order")` are the same key. Display-cased names live on the
/// description and rendered records, not here.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelKey {
    group: String,
    name: String,
}

impl ModelKey {
    /// Build a key from a group label and a type name.
    ///
    /// The name is lowercased; the group label is taken as-is.
    pub fn new(group: impl Into<String>, name: impl AsRef<str>) -> Self {
        Self {
            group: group.into(),
            name: name.as_ref().to_lowercase(),
        }
    }

    /// The owning group label.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The lowercased type name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.group, self.name)
    }
}
