//! The isolated type registry: group and model tables over rendered
//! types, with pending-lookup bookkeeping.
//!
//! A registry is self-contained and disposable: it owns its rendered
//! records, its pending table, and a shared handle to the catalog that
//! rebuilt them. Two registries never share mutable state, so one can be
//! rebuilt or thrown away without looking at any other.

use indexmap::IndexMap;
use std::sync::Arc;

use kiln_core::{
    DefError, ModelDef, ModelKey, ModelSource, RenderedField, RenderedModel, SchemaCatalog,
};

use crate::error::RenderError;
use crate::graph::RelationGraph;
use crate::pending::PendingLookups;
use crate::render::{ordinal_schema, RenderStats};

/// A group's slot in the registry.
///
/// Groups exist only because at least one type registered under their
/// label; there is no separate group configuration to install.
#[derive(Debug, Default)]
pub struct GroupEntry {
    label: String,
    pub(crate) models: IndexMap<String, RenderedModel>,
}

impl GroupEntry {
    fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            models: IndexMap::new(),
        }
    }

    /// The group label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Rendered types in registration order.
    pub fn models(&self) -> impl Iterator<Item = &RenderedModel> {
        self.models.values()
    }

    /// Number of rendered types in the group.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the group currently holds no types.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Group and model tables over rendered types.
#[derive(Debug)]
pub struct ModelRegistry {
    pub(crate) catalog: Arc<SchemaCatalog>,
    pub(crate) groups: IndexMap<String, GroupEntry>,
    pub(crate) pending: PendingLookups,
    pub(crate) graph: Option<RelationGraph>,
    pub(crate) stats: RenderStats,
}

impl ModelRegistry {
    /// An empty registry rebuilding through `catalog`.
    pub fn new(catalog: Arc<SchemaCatalog>) -> Self {
        Self {
            catalog,
            groups: IndexMap::new(),
            pending: PendingLookups::new(),
            graph: None,
            stats: RenderStats::default(),
        }
    }

    /// The catalog this registry rebuilds through.
    pub fn catalog(&self) -> &Arc<SchemaCatalog> {
        &self.catalog
    }

    /// Insert a rendered type, creating its group slot on first use, then
    /// drain pending obligations waiting on its key.
    ///
    /// Re-registering a key replaces the previous record.
    pub fn register(&mut self, model: RenderedModel) {
        let key = model.key();
        self.groups
            .entry(model.group.clone())
            .or_insert_with(|| GroupEntry::new(&model.group))
            .models
            .insert(key.name().to_string(), model);
        self.graph = None;
        tracing::trace!("registered {}", key);
        self.resolve_obligations(&key);
    }

    /// Remove a rendered type if present; silently a no-op otherwise,
    /// since unregister runs defensively mid-reload.
    ///
    /// Obligations consumed by the removed type are dropped with it; its
    /// re-render queues fresh ones for whatever still dangles.
    pub fn unregister(&mut self, key: &ModelKey) {
        if let Some(group) = self.groups.get_mut(key.group()) {
            if group.models.shift_remove(key.name()).is_some() {
                self.graph = None;
                tracing::trace!("unregistered {}", key);
            }
        }
        self.pending.purge_consumer(key);
    }

    /// The rendered type under `key`, if registered.
    pub fn model(&self, key: &ModelKey) -> Option<&RenderedModel> {
        self.groups
            .get(key.group())
            .and_then(|group| group.models.get(key.name()))
    }

    /// Like [`ModelRegistry::model`], but a miss is an error.
    pub fn expect_model(&self, key: &ModelKey) -> Result<&RenderedModel, RenderError> {
        self.model(key).ok_or_else(|| RenderError::ModelNotFound {
            key: key.clone(),
        })
    }

    fn model_mut(&mut self, key: &ModelKey) -> Option<&mut RenderedModel> {
        self.groups
            .get_mut(key.group())
            .and_then(|group| group.models.get_mut(key.name()))
    }

    /// Group slots in creation order.
    pub fn groups(&self) -> impl Iterator<Item = &GroupEntry> {
        self.groups.values()
    }

    /// The group slot under `label`, if any type registered there.
    pub fn group(&self, label: &str) -> Option<&GroupEntry> {
        self.groups.get(label)
    }

    /// Total number of rendered types.
    pub fn len(&self) -> usize {
        self.groups.values().map(GroupEntry::len).sum()
    }

    /// Whether no types are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counters from the build and from pending resolution.
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Keys that still have queued obligations, in insertion order.
    pub fn pending_targets(&self) -> Vec<ModelKey> {
        self.pending.targets().cloned().collect()
    }

    /// Whether any obligations are queued at all.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Describe a registered type as a plain description.
    ///
    /// Fields round-trip through the catalog; `strip_relations` produces
    /// the base-target-only form used for external groups.
    pub fn describe(
        &self,
        key: &ModelKey,
        strip_relations: bool,
    ) -> Result<ModelDef, RenderError> {
        let model = self.expect_model(key)?;
        ModelDef::from_source_model(self, model, self.catalog.as_ref(), strip_relations)
            .map_err(RenderError::from)
    }

    /// Types with an edge pointing at `key`, from the cached graph.
    ///
    /// Builds the graph if no cached one survives the last mutation.
    pub fn reverse_related(&mut self, key: &ModelKey) -> Vec<ModelKey> {
        if self.graph.is_none() {
            self.graph = Some(RelationGraph::build(self.iter_models()));
        }
        self.graph
            .as_ref()
            .map(|graph| graph.related_to(key).to_vec())
            .unwrap_or_default()
    }

    /// Deep-copy the registry.
    ///
    /// Every field slot rebuilds through the catalog; edges, synthetic
    /// markers, pending obligations, and stats carry over; manager
    /// instances are shared, being immutable. The copy and the original
    /// share no mutable state.
    pub fn try_clone(&self) -> Result<Self, RenderError> {
        let mut groups = IndexMap::with_capacity(self.groups.len());
        for (label, entry) in &self.groups {
            let mut models = IndexMap::with_capacity(entry.models.len());
            for (name, model) in &entry.models {
                models.insert(name.clone(), self.clone_rendered(model)?);
            }
            groups.insert(
                label.clone(),
                GroupEntry {
                    label: entry.label.clone(),
                    models,
                },
            );
        }
        Ok(Self {
            catalog: Arc::clone(&self.catalog),
            groups,
            pending: self.pending.clone(),
            graph: None,
            stats: self.stats.clone(),
        })
    }

    fn clone_rendered(&self, model: &RenderedModel) -> Result<RenderedModel, RenderError> {
        let mut fields = Vec::with_capacity(model.fields.len());
        for slot in &model.fields {
            let schema = if slot.synthetic {
                ordinal_schema()
            } else {
                self.catalog
                    .rebuild_field(&slot.schema.decompose())
                    .map_err(|source| {
                        RenderError::Def(DefError::FieldRebuild {
                            model: model.key(),
                            field: slot.name.clone(),
                            source,
                        })
                    })?
            };
            fields.push(RenderedField {
                name: slot.name.clone(),
                schema,
                relation: slot.relation.clone(),
                synthetic: slot.synthetic,
            });
        }
        Ok(RenderedModel {
            group: model.group.clone(),
            name: model.name.clone(),
            fields,
            options: model.options.clone(),
            bases: model.bases.clone(),
            managers: model.managers.clone(),
        })
    }

    fn iter_models(&self) -> impl Iterator<Item = &RenderedModel> {
        self.groups.values().flat_map(|group| group.models.values())
    }

    /// Apply every obligation queued under `target`.
    pub(crate) fn resolve_obligations(&mut self, target: &ModelKey) {
        let obligations = self.pending.take(target);
        if obligations.is_empty() {
            return;
        }
        let mut applied = 0u32;
        for obligation in obligations {
            let Some(consumer) = self.model_mut(&obligation.consumer) else {
                continue;
            };
            let Some(slot) = consumer.field_by_name_mut(&obligation.field) else {
                continue;
            };
            if let Some(edge) = slot.relation.as_mut() {
                if edge.target == *target {
                    edge.resolved = true;
                    applied += 1;
                }
            }
        }
        if applied > 0 {
            self.graph = None;
            self.stats.resolved_references += applied;
            tracing::trace!("resolved {} pending references to {}", applied, target);
        }
    }
}

impl ModelSource for ModelRegistry {
    fn model(&self, key: &ModelKey) -> Option<&RenderedModel> {
        ModelRegistry::model(self, key)
    }

    fn group_models(&self, group: &str) -> Vec<&RenderedModel> {
        self.groups
            .get(group)
            .map(|entry| entry.models.values().collect())
            .unwrap_or_default()
    }

    // Substitution is a snapshot-level concept; the registry holds every
    // type it rendered, so the flag changes nothing here.
    fn models(&self, _include_substituted: bool) -> Vec<&RenderedModel> {
        self.iter_models().collect()
    }
}
