//! The capability catalog: tag-to-builder tables for rebuilding fields
//! and managers from decomposed parts.
//!
//! There is no global lookup: whoever constructs descriptions, clones, or
//! registries passes a catalog in explicitly, and two catalogs with
//! different builder sets are simply different engines. Registration order
//! is preserved for diagnostics.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ReconstructError;
use crate::field::{FieldParts, SchemaField};
use crate::manager::{ManagerParts, SchemaManager};

/// Rebuilds a field from its decomposed parts.
pub type FieldBuilder =
    Box<dyn Fn(&FieldParts) -> Result<Box<dyn SchemaField>, ReconstructError> + Send + Sync>;

/// Rebuilds a manager from its decomposed parts.
pub type ManagerBuilder =
    Box<dyn Fn(&ManagerParts) -> Result<Arc<dyn SchemaManager>, ReconstructError> + Send + Sync>;

/// Tag-to-builder tables for the reconstruction protocol.
///
/// # Example
///
/// ```
/// use kiln_core::{FieldParts, ReconstructError, SchemaCatalog, SchemaField};
///
/// #[derive(Debug)]
/// struct Flag;
///
/// impl SchemaField for Flag {
///     fn decompose(&self) -> FieldParts {
///         FieldParts::new("flag")
///     }
/// }
///
/// fn build_flag(_parts: &FieldParts) -> Result<Box<dyn SchemaField>, ReconstructError> {
///     Ok(Box::new(Flag))
/// }
///
/// let mut catalog = SchemaCatalog::new();
/// catalog.register_field("flag", build_flag).unwrap();
///
/// let rebuilt = catalog.rebuild_field(&FieldParts::new("flag")).unwrap();
/// assert_eq!(rebuilt.decompose().tag, "flag");
/// ```
pub struct SchemaCatalog {
    fields: IndexMap<String, FieldBuilder>,
    managers: IndexMap<String, ManagerBuilder>,
    /// Designated default manager: `(tag, attachment name)`.
    default_manager: Option<(String, String)>,
}

impl SchemaCatalog {
    /// An empty catalog with no builders registered.
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
            managers: IndexMap::new(),
            default_manager: None,
        }
    }

    /// Register a field builder under `tag`.
    ///
    /// Rejects a tag that already has a builder; replacing a builder
    /// silently would change the meaning of every stored recipe using it.
    pub fn register_field<F>(
        &mut self,
        tag: impl Into<String>,
        builder: F,
    ) -> Result<(), ReconstructError>
    where
        F: Fn(&FieldParts) -> Result<Box<dyn SchemaField>, ReconstructError>
            + Send
            + Sync
            + 'static,
    {
        let tag = tag.into();
        if self.fields.contains_key(&tag) {
            return Err(ReconstructError::DuplicateTag { tag });
        }
        self.fields.insert(tag, Box::new(builder));
        Ok(())
    }

    /// Register a manager builder under `tag`.
    pub fn register_manager<F>(
        &mut self,
        tag: impl Into<String>,
        builder: F,
    ) -> Result<(), ReconstructError>
    where
        F: Fn(&ManagerParts) -> Result<Arc<dyn SchemaManager>, ReconstructError>
            + Send
            + Sync
            + 'static,
    {
        let tag = tag.into();
        if self.managers.contains_key(&tag) {
            return Err(ReconstructError::DuplicateTag { tag });
        }
        self.managers.insert(tag, Box::new(builder));
        Ok(())
    }

    /// Designate the default manager: the one materialized for types that
    /// declare none, attached under `attach_as`.
    ///
    /// The tag must already be registered.
    pub fn set_default_manager(
        &mut self,
        tag: impl Into<String>,
        attach_as: impl Into<String>,
    ) -> Result<(), ReconstructError> {
        let tag = tag.into();
        if !self.managers.contains_key(&tag) {
            return Err(ReconstructError::UnknownManagerTag { tag });
        }
        self.default_manager = Some((tag, attach_as.into()));
        Ok(())
    }

    /// Tag of the designated default manager, if any.
    pub fn default_manager_tag(&self) -> Option<&str> {
        self.default_manager.as_ref().map(|(tag, _)| tag.as_str())
    }

    /// Attachment name used when the default manager is materialized.
    pub fn default_manager_name(&self) -> Option<&str> {
        self.default_manager
            .as_ref()
            .map(|(_, name)| name.as_str())
    }

    /// Build a fresh instance of the designated default manager.
    pub fn build_default_manager(&self) -> Result<Arc<dyn SchemaManager>, ReconstructError> {
        let (tag, _) = self
            .default_manager
            .as_ref()
            .ok_or(ReconstructError::NoDefaultManager)?;
        self.rebuild_manager(&ManagerParts::new(tag.clone()))
    }

    /// Whether `parts` describe a bare instance of the default manager.
    pub fn is_default(&self, parts: &ManagerParts) -> bool {
        self.default_manager_tag() == Some(parts.tag.as_str())
            && parts.args.is_empty()
            && parts.kwargs.is_empty()
    }

    /// Rebuild a field from decomposed parts.
    pub fn rebuild_field(
        &self,
        parts: &FieldParts,
    ) -> Result<Box<dyn SchemaField>, ReconstructError> {
        let builder = self
            .fields
            .get(&parts.tag)
            .ok_or_else(|| ReconstructError::UnknownFieldTag {
                tag: parts.tag.clone(),
            })?;
        builder(parts)
    }

    /// Rebuild a manager from decomposed parts.
    pub fn rebuild_manager(
        &self,
        parts: &ManagerParts,
    ) -> Result<Arc<dyn SchemaManager>, ReconstructError> {
        let builder =
            self.managers
                .get(&parts.tag)
                .ok_or_else(|| ReconstructError::UnknownManagerTag {
                    tag: parts.tag.clone(),
                })?;
        builder(parts)
    }

    /// Whether a field builder exists for `tag`.
    pub fn has_field_tag(&self, tag: &str) -> bool {
        self.fields.contains_key(tag)
    }

    /// Whether a manager builder exists for `tag`.
    pub fn has_manager_tag(&self, tag: &str) -> bool {
        self.managers.contains_key(tag)
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SchemaCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaCatalog")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("managers", &self.managers.keys().collect::<Vec<_>>())
            .field("default_manager", &self.default_manager)
            .finish()
    }
}
