//! Fixed-point rendering of descriptions into a registry.
//!
//! Descriptions may arrive in any order and reference bases that render
//! later, so the build runs as a worklist: each pass attempts everything
//! still outstanding, keeps whatever fails only on missing bases, and
//! repeats until the list empties. A pass that settles nothing means the
//! remainder can never settle (unknown or cyclic bases) and the build
//! aborts naming every stuck description.
//!
//! Forward references between fields are softer than bases: a field may
//! point at a type that has not rendered yet. Such edges render
//! unresolved with a queued obligation, and registration of the target
//! back-fills them. Whatever is still dangling once the worklist empties
//! is reported in one aggregate error, except edges to the designated
//! substitutable type, which stay pending.

use std::sync::Arc;

use kiln_core::{
    BaseRef, DefError, FieldDecl, FieldParts, ManagerDecl, ModelDef, ModelKey, RelationEdge,
    RelationTarget, RenderedField, RenderedModel, SchemaCatalog, SchemaField,
};

use crate::error::{RenderError, UnresolvedReference};
use crate::pending::Obligation;
use crate::registry::ModelRegistry;

/// Name of the synthetic field materialized for types with an ordering
/// option. Imports recognize it by the slot's `synthetic` marker, not by
/// this name.
pub const ORDINAL_FIELD: &str = "_ordinal";

/// The engine-owned schema behind the ordinal slot.
///
/// Not registered in any catalog: clones carry the slot over directly
/// and imports skip it, so its recipe never needs rebuilding.
#[derive(Debug)]
struct OrdinalField;

impl SchemaField for OrdinalField {
    fn decompose(&self) -> FieldParts {
        FieldParts::new("ordinal")
    }
}

pub(crate) fn ordinal_schema() -> Box<dyn SchemaField> {
    Box::new(OrdinalField)
}

/// Counters recorded while building and maintaining a registry.
#[derive(Clone, Debug, Default)]
pub struct RenderStats {
    /// Worklist passes taken to reach the fixed point.
    pub passes: u32,
    /// Successful renders, counting re-renders of the same key.
    pub rendered: u32,
    /// Unresolved edges back-filled after their target registered.
    pub resolved_references: u32,
}

impl ModelRegistry {
    /// Render every description into a fresh registry.
    ///
    /// `defs` may be in any order; bases are resolved by retrying across
    /// passes. `substitutable` names the one key tolerated as missing
    /// after the build (its edges stay pending); `None` is strict.
    ///
    /// A chain of bases with depth `d` settles in at most `d + 1`
    /// passes, whatever the input order.
    pub fn render_all(
        catalog: Arc<SchemaCatalog>,
        defs: &[&ModelDef],
        substitutable: Option<&ModelKey>,
    ) -> Result<Self, RenderError> {
        let mut registry = Self::new(catalog);
        let mut worklist: Vec<&ModelDef> = defs.to_vec();
        while !worklist.is_empty() {
            registry.stats.passes += 1;
            let before = worklist.len();
            let mut deferred = Vec::new();
            for def in worklist {
                match registry.render_and_register(def) {
                    Ok(()) => {}
                    Err(RenderError::InvalidBases { .. }) => deferred.push(def),
                    Err(other) => return Err(other),
                }
            }
            if deferred.len() == before {
                return Err(RenderError::BaseResolution {
                    stuck: deferred.iter().map(|def| def.key()).collect(),
                });
            }
            tracing::debug!(
                "render pass {}: settled {} of {} descriptions",
                registry.stats.passes,
                before - deferred.len(),
                before
            );
            worklist = deferred;
        }
        registry.finish_pending(substitutable)?;
        Ok(registry)
    }

    /// Render one description and register the result.
    ///
    /// Nothing is registered on failure. `InvalidBases` is the one
    /// recoverable error: the description can be retried once its bases
    /// have rendered.
    pub fn render_and_register(&mut self, def: &ModelDef) -> Result<(), RenderError> {
        let key = def.key();

        // 1. Every concrete base must already be rendered.
        let missing: Vec<ModelKey> = def
            .bases()
            .iter()
            .filter_map(|base| match base {
                BaseRef::Model(base_key) if self.model(base_key).is_none() => {
                    Some(base_key.clone())
                }
                _ => None,
            })
            .collect();
        if !missing.is_empty() {
            return Err(RenderError::InvalidBases {
                model: key,
                missing,
            });
        }

        // 2. Rebuild fields through the catalog and compute relation
        //    edges. Self-references and targets already registered are
        //    resolved; anything else renders unresolved and queues an
        //    obligation once the type registers.
        let mut fields = Vec::with_capacity(def.fields().len() + 1);
        let mut dangling: Vec<(String, ModelKey)> = Vec::new();
        for decl in def.rebuilt_fields(self.catalog.as_ref())? {
            let FieldDecl { name, schema } = decl;
            let relation = schema.relation().map(|rel| {
                let target = match rel.target {
                    RelationTarget::SelfRef => key.clone(),
                    RelationTarget::Model(target) => target,
                };
                let resolved = target == key || self.model(&target).is_some();
                if !resolved {
                    dangling.push((name.clone(), target.clone()));
                }
                RelationEdge {
                    target,
                    kind: rel.kind,
                    resolved,
                }
            });
            fields.push(RenderedField {
                name,
                schema,
                relation,
                synthetic: false,
            });
        }

        // 3. Rebuild managers in attachment order; a type declaring none
        //    gets the catalog's default manager, when one is designated.
        let mut ordered: Vec<&ManagerDecl> = def.managers().iter().collect();
        ordered.sort_by_key(|decl| decl.instance.creation_seq());
        let mut managers = Vec::with_capacity(ordered.len());
        for decl in ordered {
            let instance = self
                .catalog
                .rebuild_manager(&decl.instance.decompose())
                .map_err(|source| DefError::ManagerRebuild {
                    model: key.clone(),
                    manager: decl.name.clone(),
                    source,
                })?;
            managers.push(ManagerDecl::new(decl.name.clone(), instance));
        }
        if managers.is_empty() {
            if let Some(attach_as) = self.catalog.default_manager_name() {
                let attach_as = attach_as.to_string();
                let instance = self.catalog.build_default_manager().map_err(|source| {
                    DefError::ManagerRebuild {
                        model: key.clone(),
                        manager: attach_as.clone(),
                        source,
                    }
                })?;
                managers.push(ManagerDecl::new(attach_as, instance));
            }
        }

        // 4. An ordering option must name a declared field; the ordinal
        //    slot it implies goes last and is marked synthetic.
        if let Some(order_field) = def.options().order_with_field.as_deref() {
            if !fields.iter().any(|field| field.name == order_field) {
                return Err(RenderError::UnknownOrderingField {
                    model: key,
                    field: order_field.to_string(),
                });
            }
            fields.push(RenderedField {
                name: ORDINAL_FIELD.to_string(),
                schema: ordinal_schema(),
                relation: None,
                synthetic: true,
            });
        }

        let rendered = RenderedModel {
            group: def.group().to_string(),
            name: def.name().to_string(),
            fields,
            options: def.options().clone(),
            bases: def.bases().to_vec(),
            managers,
        };

        // 5. Queue obligations before registering: registration drains
        //    the new key, which also settles explicit self-targets.
        for (field, target) in dangling {
            self.pending.defer(target, Obligation::new(key.clone(), field));
        }
        self.register(rendered);
        self.stats.rendered += 1;
        Ok(())
    }

    /// Drain the pending table at the end of a build.
    ///
    /// Targets registered since their obligations were queued are
    /// back-filled; a target equal to `substitutable` stays pending;
    /// everything else is collected into one aggregate error.
    fn finish_pending(&mut self, substitutable: Option<&ModelKey>) -> Result<(), RenderError> {
        let mut failures = Vec::new();
        for target in self.pending_targets() {
            if self.model(&target).is_some() {
                self.resolve_obligations(&target);
                continue;
            }
            if substitutable == Some(&target) {
                continue;
            }
            for obligation in self.pending.obligations_for(&target) {
                failures.push(UnresolvedReference {
                    consumer: obligation.consumer.clone(),
                    field: obligation.field.clone(),
                    target: target.clone(),
                });
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(RenderError::UnresolvedReferences { failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_core::ModelOptions;
    use kiln_test_utils::fixtures;

    fn catalog() -> Arc<SchemaCatalog> {
        Arc::new(fixtures::catalog())
    }

    fn chain_defs(depth: usize) -> Vec<ModelDef> {
        (0..=depth)
            .map(|level| {
                let bases = if level == 0 {
                    vec![]
                } else {
                    vec![BaseRef::Model(ModelKey::new(
                        "chain",
                        format!("Level{}", level - 1),
                    ))]
                };
                ModelDef::new(
                    "chain",
                    format!("Level{level}"),
                    vec![fixtures::text_field("note")],
                    ModelOptions::default(),
                    bases,
                    vec![],
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn independent_types_settle_in_one_pass() {
        let defs = [fixtures::author_def(), fixtures::simple_def("library", "Shelf", &["label"])];
        let refs: Vec<&ModelDef> = defs.iter().collect();
        let registry = ModelRegistry::render_all(catalog(), &refs, None).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.stats().passes, 1);
        assert_eq!(registry.stats().rendered, 2);
    }

    #[test]
    fn base_chain_in_worst_order_takes_depth_plus_one_passes() {
        let defs = chain_defs(2);
        let refs: Vec<&ModelDef> = defs.iter().rev().collect();
        let registry = ModelRegistry::render_all(catalog(), &refs, None).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.stats().passes, 3);
    }

    #[test]
    fn base_cycle_names_both_stuck_keys() {
        let first = ModelDef::new(
            "library",
            "Alpha",
            vec![],
            ModelOptions::default(),
            vec![BaseRef::Model(ModelKey::new("library", "Beta"))],
            vec![],
        )
        .unwrap();
        let second = ModelDef::new(
            "library",
            "Beta",
            vec![],
            ModelOptions::default(),
            vec![BaseRef::Model(ModelKey::new("library", "Alpha"))],
            vec![],
        )
        .unwrap();
        match ModelRegistry::render_all(catalog(), &[&first, &second], None) {
            Err(RenderError::BaseResolution { stuck }) => {
                assert_eq!(
                    stuck,
                    vec![
                        ModelKey::new("library", "Alpha"),
                        ModelKey::new("library", "Beta"),
                    ]
                );
            }
            other => panic!("expected BaseResolution, got {other:?}"),
        }
    }

    #[test]
    fn missing_base_names_the_dependent() {
        let orphan = ModelDef::new(
            "library",
            "Orphan",
            vec![],
            ModelOptions::default(),
            vec![BaseRef::Model(ModelKey::new("elsewhere", "Gone"))],
            vec![],
        )
        .unwrap();
        match ModelRegistry::render_all(catalog(), &[&orphan], None) {
            Err(RenderError::BaseResolution { stuck }) => {
                assert_eq!(stuck, vec![ModelKey::new("library", "Orphan")]);
            }
            other => panic!("expected BaseResolution, got {other:?}"),
        }
    }

    #[test]
    fn forward_reference_resolves_within_the_build() {
        let book = fixtures::book_def();
        let author = fixtures::author_def();
        // Book renders first, pointing at an Author not yet registered.
        let registry = ModelRegistry::render_all(catalog(), &[&book, &author], None).unwrap();
        let rendered = registry.model(&book.key()).unwrap();
        let edge = rendered.field_by_name("author").unwrap().relation.as_ref().unwrap();
        assert!(edge.resolved);
        assert_eq!(edge.target, author.key());
        assert!(!registry.has_pending());
        assert_eq!(registry.stats().resolved_references, 1);
    }

    #[test]
    fn dangling_references_reported_together() {
        let book = fixtures::book_def();
        let review = ModelDef::new(
            "library",
            "Review",
            vec![fixtures::fk_field("publisher", "press", "Publisher")],
            ModelOptions::default(),
            vec![],
            vec![],
        )
        .unwrap();
        match ModelRegistry::render_all(catalog(), &[&book, &review], None) {
            Err(RenderError::UnresolvedReferences { failures }) => {
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].consumer, book.key());
                assert_eq!(failures[0].field, "author");
                assert_eq!(failures[0].target, ModelKey::new("library", "Author"));
                assert_eq!(failures[1].consumer, review.key());
                assert_eq!(failures[1].target, ModelKey::new("press", "Publisher"));
            }
            other => panic!("expected UnresolvedReferences, got {other:?}"),
        }
    }

    #[test]
    fn substitutable_target_stays_pending() {
        let accounts = ModelKey::new("accounts", "User");
        let book = ModelDef::new(
            "library",
            "Book",
            vec![fixtures::fk_field("owner", "accounts", "User")],
            ModelOptions::default(),
            vec![],
            vec![],
        )
        .unwrap();
        let registry =
            ModelRegistry::render_all(catalog(), &[&book], Some(&accounts)).unwrap();
        assert!(registry.has_pending());
        assert_eq!(registry.pending_targets(), vec![accounts]);
        let edge = registry
            .model(&book.key())
            .unwrap()
            .field_by_name("owner")
            .unwrap()
            .relation
            .as_ref()
            .unwrap();
        assert!(!edge.resolved);
    }

    #[test]
    fn self_reference_resolves_to_own_key() {
        let def = ModelDef::new(
            "org",
            "Unit",
            vec![FieldDecl::new(
                "parent",
                Box::new(fixtures::ForeignKeyField::to_self()),
            )],
            ModelOptions::default(),
            vec![],
            vec![],
        )
        .unwrap();
        let registry = ModelRegistry::render_all(catalog(), &[&def], None).unwrap();
        let edge = registry
            .model(&def.key())
            .unwrap()
            .field_by_name("parent")
            .unwrap()
            .relation
            .as_ref()
            .unwrap();
        assert!(edge.resolved);
        assert_eq!(edge.target, def.key());
        assert!(!registry.has_pending());
    }

    #[test]
    fn explicit_own_key_treated_as_self_reference() {
        let def = ModelDef::new(
            "org",
            "Unit",
            vec![fixtures::fk_field("parent", "org", "Unit")],
            ModelOptions::default(),
            vec![],
            vec![],
        )
        .unwrap();
        let registry = ModelRegistry::render_all(catalog(), &[&def], None).unwrap();
        let edge = registry
            .model(&def.key())
            .unwrap()
            .field_by_name("parent")
            .unwrap()
            .relation
            .as_ref()
            .unwrap();
        assert!(edge.resolved);
        assert!(!registry.has_pending());
    }

    #[test]
    fn ordering_option_materializes_one_synthetic_field() {
        let mut def = fixtures::book_def();
        def.options_mut().order_with_field = Some("author".to_string());
        let author = fixtures::author_def();
        let registry = ModelRegistry::render_all(catalog(), &[&author, &def], None).unwrap();
        let rendered = registry.model(&def.key()).unwrap();
        assert_eq!(rendered.fields.len(), 3);
        let ordinal = rendered.fields.last().unwrap();
        assert_eq!(ordinal.name, ORDINAL_FIELD);
        assert!(ordinal.synthetic);
        assert!(ordinal.relation.is_none());
        assert_eq!(rendered.fields.iter().filter(|f| f.synthetic).count(), 1);
    }

    #[test]
    fn ordering_option_must_name_a_field() {
        let mut def = fixtures::author_def();
        def.options_mut().order_with_field = Some("ghost".to_string());
        match ModelRegistry::render_all(catalog(), &[&def], None) {
            Err(RenderError::UnknownOrderingField { model, field }) => {
                assert_eq!(model, def.key());
                assert_eq!(field, "ghost");
            }
            other => panic!("expected UnknownOrderingField, got {other:?}"),
        }
    }

    #[test]
    fn empty_manager_list_materializes_catalog_default() {
        let def = fixtures::author_def();
        let registry = ModelRegistry::render_all(catalog(), &[&def], None).unwrap();
        let rendered = registry.model(&def.key()).unwrap();
        assert_eq!(rendered.managers.len(), 1);
        assert_eq!(rendered.managers[0].name, "records");
        assert_eq!(rendered.managers[0].parts().tag, "plain");
    }

    #[test]
    fn declared_managers_rebuilt_in_attachment_order() {
        let records = fixtures::plain_manager("records");
        let archived = fixtures::audit_manager("archived", 30);
        let def = ModelDef::new(
            "library",
            "Author",
            vec![fixtures::text_field("name")],
            ModelOptions::default(),
            vec![],
            // Declared out of attachment order on purpose.
            vec![archived.clone(), records.clone()],
        )
        .unwrap();
        let registry = ModelRegistry::render_all(catalog(), &[&def], None).unwrap();
        let rendered = registry.model(&def.key()).unwrap();
        let names: Vec<&str> = rendered.managers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["records", "archived"]);
        assert_eq!(rendered.managers[1].parts(), archived.parts());
        // Instances are rebuilt through the catalog, not shared.
        assert!(!Arc::ptr_eq(&rendered.managers[0].instance, &records.instance));
    }

    #[test]
    fn field_rebuild_failure_carries_model_and_field() {
        let def = ModelDef::new(
            "library",
            "Broken",
            vec![FieldDecl::new("cursed", Box::new(fixtures::FailingField))],
            ModelOptions::default(),
            vec![],
            vec![],
        )
        .unwrap();
        match ModelRegistry::render_all(catalog(), &[&def], None) {
            Err(RenderError::Def(DefError::FieldRebuild { model, field, .. })) => {
                assert_eq!(model, def.key());
                assert_eq!(field, "cursed");
            }
            other => panic!("expected FieldRebuild, got {other:?}"),
        }
    }

    #[test]
    fn failed_render_registers_nothing() {
        let mut registry = ModelRegistry::new(catalog());
        let mut def = fixtures::author_def();
        def.options_mut().order_with_field = Some("ghost".to_string());
        assert!(registry.render_and_register(&def).is_err());
        assert!(registry.is_empty());
        assert!(!registry.has_pending());
        assert_eq!(registry.stats().rendered, 0);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn pass_count_bounded_by_chain_depth(
                order in (1usize..6).prop_flat_map(|depth| {
                    Just((0..=depth).collect::<Vec<usize>>()).prop_shuffle()
                })
            ) {
                let depth = order.len() - 1;
                let defs = chain_defs(depth);
                let shuffled: Vec<&ModelDef> = order.iter().map(|&i| &defs[i]).collect();
                let registry =
                    ModelRegistry::render_all(catalog(), &shuffled, None).unwrap();
                prop_assert_eq!(registry.len(), depth + 1);
                prop_assert!(registry.stats().passes as usize <= depth + 1);
            }

            #[test]
            fn rendered_total_matches_input(count in 1usize..12) {
                let defs: Vec<ModelDef> = (0..count)
                    .map(|i| fixtures::simple_def("bulk", &format!("Item{i}"), &["note"]))
                    .collect();
                let refs: Vec<&ModelDef> = defs.iter().collect();
                let registry = ModelRegistry::render_all(catalog(), &refs, None).unwrap();
                prop_assert_eq!(registry.stats().rendered as usize, count);
                prop_assert_eq!(registry.len(), count);
            }
        }
    }
}
