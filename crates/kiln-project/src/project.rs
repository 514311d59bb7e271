//! The project-wide schema snapshot.
//!
//! A [`ProjectSchema`] is the authoritative collection of descriptions
//! for one point in a project's history. It stays cheap until someone
//! asks for usable types: the registry is built lazily from every
//! description (plus absorbed external types) and then kept consistent
//! through the incremental add/remove/reload paths instead of being
//! rebuilt wholesale.
//!
//! Snapshots compare by their descriptions and external group list
//! only. The registry is derived state and never participates in
//! equality or cloning semantics beyond being deep-copied when present.

use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

use kiln_core::{ModelDef, ModelKey, ModelSource, RenderedModel, SchemaCatalog};
use kiln_registry::ModelRegistry;

use crate::error::ProjectError;

/// Types owned by the environment rather than the snapshot.
///
/// The source hands out already-rendered types; the group list names
/// which of its groups the snapshot absorbs. Absorbed types are imported
/// in stripped form (no relation fields) purely so project types can use
/// them as bases. Both handles are shared across clones.
pub struct ExternalTypes {
    source: Arc<dyn ModelSource + Send + Sync>,
    groups: Arc<[String]>,
}

impl ExternalTypes {
    /// Group labels absorbed from the source.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }
}

impl Clone for ExternalTypes {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            groups: Arc::clone(&self.groups),
        }
    }
}

impl fmt::Debug for ExternalTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalTypes")
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

/// The project-wide aggregate of type descriptions.
#[derive(Debug)]
pub struct ProjectSchema {
    catalog: Arc<SchemaCatalog>,
    models: IndexMap<ModelKey, ModelDef>,
    external: Option<ExternalTypes>,
    substitutable: Option<ModelKey>,
    registry: Option<ModelRegistry>,
}

impl ProjectSchema {
    /// An empty snapshot rebuilding through `catalog`.
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self {
            catalog,
            models: IndexMap::new(),
            external: None,
            substitutable: None,
            registry: None,
        }
    }

    /// An empty snapshot that also absorbs the named groups from an
    /// external source whenever its registry is built.
    pub fn with_external(
        catalog: Arc<SchemaCatalog>,
        source: Arc<dyn ModelSource + Send + Sync>,
        groups: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            external: Some(ExternalTypes {
                source,
                groups: groups.into_iter().map(Into::into).collect(),
            }),
            ..Self::new(catalog)
        }
    }

    /// Snapshot an existing source of rendered types.
    ///
    /// Every type the source yields is imported back into a description,
    /// relations intact. `include_substituted` asks the source to also
    /// yield types a substitutable designation has replaced.
    pub fn from_source(
        catalog: Arc<SchemaCatalog>,
        source: &dyn ModelSource,
        include_substituted: bool,
    ) -> Result<Self, ProjectError> {
        let mut schema = Self::new(catalog);
        for model in source.models(include_substituted) {
            let def =
                ModelDef::from_source_model(source, model, schema.catalog.as_ref(), false)?;
            schema.models.insert(def.key(), def);
        }
        Ok(schema)
    }

    /// The catalog this snapshot rebuilds through.
    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    /// Designate (or clear) the one key tolerated as missing by
    /// [`ProjectSchema::concrete_registry`].
    pub fn set_substitutable(&mut self, key: Option<ModelKey>) {
        self.substitutable = key;
    }

    /// The designated substitutable key, if any.
    pub fn substitutable(&self) -> Option<&ModelKey> {
        self.substitutable.as_ref()
    }

    /// Group labels absorbed from the external source, empty when the
    /// snapshot has none.
    pub fn external_groups(&self) -> &[String] {
        self.external
            .as_ref()
            .map(ExternalTypes::groups)
            .unwrap_or(&[])
    }

    /// Descriptions in insertion order.
    pub fn models(&self) -> impl Iterator<Item = &ModelDef> {
        self.models.values()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &ModelKey> {
        self.models.keys()
    }

    /// The description under `key`, if present.
    pub fn model(&self, key: &ModelKey) -> Option<&ModelDef> {
        self.models.get(key)
    }

    /// Mutable access to a description, for edits that are followed by a
    /// [`ProjectSchema::reload_model`].
    pub fn model_mut(&mut self, key: &ModelKey) -> Option<&mut ModelDef> {
        self.models.get_mut(key)
    }

    /// Number of descriptions held.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the snapshot holds no descriptions.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Whether a registry has been built and is being kept consistent.
    pub fn registry_built(&self) -> bool {
        self.registry.is_some()
    }

    /// Insert a description keyed by its identity, replacing any
    /// previous description under the same key.
    ///
    /// If a registry is already built, the type and its relational
    /// neighborhood are re-rendered immediately.
    pub fn add_model(&mut self, def: ModelDef) -> Result<(), ProjectError> {
        let key = def.key();
        self.models.insert(key.clone(), def);
        tracing::debug!("added {} to project schema", key);
        if self.registry.is_some() {
            self.reload_model(&key)?;
        }
        Ok(())
    }

    /// Remove the description under `key`.
    ///
    /// If a registry is built, the rendered type is unregistered there;
    /// types still pointing at it keep unresolved edges until the next
    /// full build reports them.
    pub fn remove_model(&mut self, key: &ModelKey) -> Result<(), ProjectError> {
        if self.models.shift_remove(key).is_none() {
            return Err(ProjectError::ModelNotFound { key: key.clone() });
        }
        tracing::debug!("removed {} from project schema", key);
        if let Some(registry) = self.registry.as_mut() {
            registry.unregister(key);
        }
        Ok(())
    }

    /// Re-render one description and its relational neighborhood.
    ///
    /// A no-op until a registry exists. The neighborhood is every type
    /// that pointed at the old rendering plus the fresh rendering's
    /// many-to-many targets; a type with such targets renders a second
    /// time after them. Re-rendering the same key repeatedly converges
    /// to the same registry state.
    pub fn reload_model(&mut self, key: &ModelKey) -> Result<(), ProjectError> {
        let Some(registry) = self.registry.as_mut() else {
            return Ok(());
        };
        let Some(def) = self.models.get(key) else {
            return Err(ProjectError::ModelNotFound { key: key.clone() });
        };

        // 1. Types that pointed at the old rendering, before it goes.
        let mut neighborhood = registry.reverse_related(key);

        // 2. Re-render the type itself.
        registry.unregister(key);
        registry.render_and_register(def)?;

        // 3. The fresh rendering's many-to-many targets join the set.
        let m2m_targets = registry
            .model(key)
            .map(RenderedModel::m2m_targets)
            .unwrap_or_default();
        for target in &m2m_targets {
            if !neighborhood.contains(target) {
                neighborhood.push(target.clone());
            }
        }

        // 4. Re-render the neighborhood. Only project-owned members have
        //    descriptions to render from; external records are left as
        //    they are.
        for other in &neighborhood {
            if other == key {
                continue;
            }
            if let Some(other_def) = self.models.get(other) {
                registry.unregister(other);
                registry.render_and_register(other_def)?;
            }
        }

        // 5. Many-to-many owners render once more, after their targets.
        if !m2m_targets.is_empty() {
            registry.unregister(key);
            registry.render_and_register(def)?;
        }

        tracing::debug!(
            "reloaded {} ({} neighborhood types)",
            key,
            neighborhood.len()
        );
        Ok(())
    }

    /// The registry of rendered types, built on first use.
    ///
    /// The build is strict: every relationship must resolve, including
    /// edges to a designated substitutable key. The result is cached and
    /// kept consistent by [`ProjectSchema::add_model`],
    /// [`ProjectSchema::remove_model`], and
    /// [`ProjectSchema::reload_model`].
    pub fn registry(&mut self) -> Result<&ModelRegistry, ProjectError> {
        if self.registry.is_none() {
            let built = self.build_registry(None)?;
            tracing::debug!(
                "built project registry: {} types in {} passes",
                built.len(),
                built.stats().passes
            );
            self.registry = Some(built);
        }
        Ok(self
            .registry
            .as_ref()
            .expect("registry cached by the branch above"))
    }

    /// Rebuild the registry unconditionally, tolerating a missing
    /// substitutable target, and replace the cache with the result.
    pub fn concrete_registry(&mut self) -> Result<&ModelRegistry, ProjectError> {
        let substitutable = self.substitutable.clone();
        let built = self.build_registry(substitutable.as_ref())?;
        tracing::debug!(
            "rebuilt concrete project registry: {} types in {} passes",
            built.len(),
            built.stats().passes
        );
        self.registry = Some(built);
        Ok(self
            .registry
            .as_ref()
            .expect("registry cached on the line above"))
    }

    fn build_registry(
        &self,
        substitutable: Option<&ModelKey>,
    ) -> Result<ModelRegistry, ProjectError> {
        let external_defs = self.external_defs()?;
        let mut defs: Vec<&ModelDef> = external_defs.iter().collect();
        defs.extend(self.models.values());
        let registry = ModelRegistry::render_all(Arc::clone(&self.catalog), &defs, substitutable)?;
        Ok(registry)
    }

    /// Import every type of every absorbed external group, stripped of
    /// relation fields, so project types can render on external bases.
    fn external_defs(&self) -> Result<Vec<ModelDef>, ProjectError> {
        let Some(external) = &self.external else {
            return Ok(Vec::new());
        };
        let mut defs = Vec::new();
        for group in external.groups.iter() {
            for model in external.source.group_models(group) {
                let def = ModelDef::from_source_model(
                    external.source.as_ref(),
                    model,
                    self.catalog.as_ref(),
                    true,
                )?;
                defs.push(def);
            }
        }
        Ok(defs)
    }

    /// Deep-copy the snapshot.
    ///
    /// Descriptions rebuild their fields through the catalog; the
    /// registry, when one is built, is deep-copied the same way — never
    /// rebuilt from scratch. The catalog, external source, and external
    /// group list are shared by reference.
    pub fn try_clone(&self) -> Result<Self, ProjectError> {
        let mut models = IndexMap::with_capacity(self.models.len());
        for (key, def) in &self.models {
            models.insert(key.clone(), def.try_clone(self.catalog.as_ref())?);
        }
        let registry = match &self.registry {
            Some(registry) => Some(registry.try_clone()?),
            None => None,
        };
        Ok(Self {
            catalog: Arc::clone(&self.catalog),
            models,
            external: self.external.clone(),
            substitutable: self.substitutable.clone(),
            registry,
        })
    }
}

/// Snapshots are equal when they hold equal descriptions under the same
/// keys and absorb the same external groups. Derived registry state
/// never participates.
impl PartialEq for ProjectSchema {
    fn eq(&self, other: &Self) -> bool {
        self.models == other.models && self.external_groups() == other.external_groups()
    }
}
