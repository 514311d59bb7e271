//! The boundary to already-materialized types, and importing them back
//! into descriptions.
//!
//! A [`ModelSource`] hands out rendered types it owns; the engine's own
//! registry implements it, and so can any environment that keeps concrete
//! types outside the engine. [`ModelDef::from_source_model`] walks a
//! rendered type back into a plain description, which is how snapshots
//! bootstrap from live state and how external-group types are absorbed.

use std::collections::HashSet;
use std::sync::Arc;

use crate::catalog::SchemaCatalog;
use crate::error::DefError;
use crate::id::ModelKey;
use crate::model::{BaseRef, FieldDecl, ManagerDecl, ModelDef};
use crate::rendered::RenderedModel;

/// A provider of rendered types.
///
/// Lookup is by identity key; iteration order of the collection methods
/// follows the source's own storage order and must be deterministic.
pub trait ModelSource {
    /// The rendered type with this key, if the source holds it.
    fn model(&self, key: &ModelKey) -> Option<&RenderedModel>;

    /// All rendered types in one group, in storage order.
    fn group_models(&self, group: &str) -> Vec<&RenderedModel>;

    /// All rendered types, in storage order.
    ///
    /// `include_substituted` asks the source to also yield types that a
    /// substitutable designation has replaced; sources without that
    /// concept ignore the flag.
    fn models(&self, include_substituted: bool) -> Vec<&RenderedModel>;
}

impl ModelDef {
    /// Build a description of a rendered type.
    ///
    /// Fields round-trip through `catalog`; synthetic fields (the
    /// materialized ordinal) are skipped. With `strip_relations`, every
    /// field declaring a relationship is skipped too and the options that
    /// list fields are cleared — the form used when absorbing
    /// external-group types a registry only needs as base targets.
    ///
    /// Abstract ancestors are flattened out of the base chain; managers
    /// are carried per their
    /// [`in_migrations`](crate::SchemaManager::in_migrations) opt-in, in
    /// attachment order, with a lone default shim dropped.
    pub fn from_source_model(
        source: &dyn ModelSource,
        model: &RenderedModel,
        catalog: &SchemaCatalog,
        strip_relations: bool,
    ) -> Result<ModelDef, DefError> {
        let key = model.key();

        let mut fields = Vec::new();
        for slot in &model.fields {
            if slot.synthetic {
                continue;
            }
            if strip_relations && slot.relation.is_some() {
                continue;
            }
            let schema = catalog
                .rebuild_field(&slot.schema.decompose())
                .map_err(|source| DefError::FieldRebuild {
                    model: key.clone(),
                    field: slot.name.clone(),
                    source,
                })?;
            fields.push(FieldDecl::new(slot.name.clone(), schema));
        }

        let mut options = model.options.clone();
        if strip_relations {
            options.strip_field_listings();
        }

        let bases = flatten_bases(source, &model.bases);
        let managers = carried_managers(model, catalog, &key)?;

        ModelDef::new(
            model.group.clone(),
            model.name.clone(),
            fields,
            options,
            bases,
            managers,
        )
    }
}

/// Flatten abstract ancestors out of a base chain.
///
/// Concrete bases stay as direct references; an abstract base contributes
/// its own bases, recursively. Duplicates keep their first position. An
/// empty result falls back to the root.
fn flatten_bases(source: &dyn ModelSource, bases: &[BaseRef]) -> Vec<BaseRef> {
    let mut flattened = Vec::new();
    let mut visited = HashSet::new();
    collect_bases(source, bases, &mut flattened, &mut visited);
    if flattened.is_empty() {
        flattened.push(BaseRef::Root);
    }
    flattened
}

fn collect_bases(
    source: &dyn ModelSource,
    bases: &[BaseRef],
    out: &mut Vec<BaseRef>,
    visited: &mut HashSet<ModelKey>,
) {
    for base in bases {
        match base {
            BaseRef::Root => push_unique(out, BaseRef::Root),
            BaseRef::Model(key) => match source.model(key) {
                Some(parent) if parent.options.is_abstract => {
                    if visited.insert(key.clone()) {
                        collect_bases(source, &parent.bases, out, visited);
                    }
                }
                _ => push_unique(out, base.clone()),
            },
        }
    }
}

fn push_unique(out: &mut Vec<BaseRef>, base: BaseRef) {
    if !out.contains(&base) {
        out.push(base);
    }
}

/// Select and order the managers a description carries.
///
/// Iteration is attachment order (`creation_seq`); a shadowed name keeps
/// its first occurrence. Managers opt in via `in_migrations`; the type's
/// default manager (lowest attachment order) is shimmed with the catalog
/// default when it does not opt in. A result that is exactly one shim
/// under the catalog's default attachment name collapses to no managers.
fn carried_managers(
    model: &RenderedModel,
    catalog: &SchemaCatalog,
    key: &ModelKey,
) -> Result<Vec<ManagerDecl>, DefError> {
    let mut ordered: Vec<&ManagerDecl> = model.managers.iter().collect();
    ordered.sort_by_key(|decl| decl.instance.creation_seq());
    let default_name = ordered.first().map(|decl| decl.name.clone());

    let mut carried = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut shim_index = None;
    for decl in ordered {
        if seen.contains(decl.name.as_str()) {
            continue;
        }
        if decl.instance.in_migrations() {
            seen.insert(decl.name.as_str());
            carried.push(ManagerDecl::new(
                decl.name.clone(),
                Arc::clone(&decl.instance),
            ));
        } else if Some(&decl.name) == default_name.as_ref() {
            seen.insert(decl.name.as_str());
            let shim =
                catalog
                    .build_default_manager()
                    .map_err(|source| DefError::ManagerRebuild {
                        model: key.clone(),
                        manager: decl.name.clone(),
                        source,
                    })?;
            shim_index = Some(carried.len());
            carried.push(ManagerDecl::new(decl.name.clone(), shim));
        }
    }

    if carried.len() == 1
        && shim_index == Some(0)
        && catalog.default_manager_name() == Some(carried[0].name.as_str())
    {
        carried.clear();
    }
    Ok(carried)
}
