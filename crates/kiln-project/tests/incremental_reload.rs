//! Integration test: incremental reload keeps a built registry
//! consistent with the snapshot.
//!
//! Once a registry exists, add/remove/reload must update it in place:
//! edits re-render exactly the affected neighborhood (observable through
//! the registry's render counters), dangling references left by a
//! removal surface on the next full rebuild, and a type added late
//! back-fills the edges that were waiting for it.

use std::sync::Arc;

use kiln_core::{ModelKey, RelationKind, SchemaCatalog};
use kiln_project::{ProjectError, ProjectSchema};
use kiln_registry::RenderError;
use kiln_test_utils::fixtures;

fn catalog() -> Arc<SchemaCatalog> {
    Arc::new(fixtures::catalog())
}

fn author_key() -> ModelKey {
    ModelKey::new("library", "Author")
}

fn book_key() -> ModelKey {
    ModelKey::new("library", "Book")
}

#[test]
fn adding_a_model_after_build_renders_it() {
    let mut schema = ProjectSchema::new(catalog());
    schema.add_model(fixtures::author_def()).unwrap();
    schema.registry().unwrap();

    schema.add_model(fixtures::book_def()).unwrap();
    let registry = schema.registry().unwrap();
    assert_eq!(registry.len(), 2);
    let edge = registry
        .model(&book_key())
        .unwrap()
        .field_by_name("author")
        .unwrap()
        .relation
        .as_ref()
        .unwrap();
    assert!(edge.resolved);
}

#[test]
fn adding_a_missing_target_resolves_waiting_edges() {
    let mut schema = ProjectSchema::new(catalog());
    schema.add_model(fixtures::book_def()).unwrap();
    schema.set_substitutable(Some(author_key()));
    // Tolerant build: the edge to the absent Author stays pending.
    let registry = schema.concrete_registry().unwrap();
    assert!(registry.has_pending());

    schema.add_model(fixtures::author_def()).unwrap();
    let registry = schema.registry().unwrap();
    assert!(!registry.has_pending());
    let edge = registry
        .model(&book_key())
        .unwrap()
        .field_by_name("author")
        .unwrap()
        .relation
        .as_ref()
        .unwrap();
    assert!(edge.resolved);
}

#[test]
fn removal_surfaces_dangling_references_on_rebuild() {
    let mut schema = ProjectSchema::new(catalog());
    schema.add_model(fixtures::author_def()).unwrap();
    schema.add_model(fixtures::book_def()).unwrap();
    schema.registry().unwrap();

    schema.remove_model(&author_key()).unwrap();
    // The cached registry no longer holds the removed type.
    assert!(schema.registry().unwrap().model(&author_key()).is_none());

    match schema.concrete_registry() {
        Err(ProjectError::Render(RenderError::UnresolvedReferences { failures })) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].consumer, book_key());
            assert_eq!(failures[0].field, "author");
            assert_eq!(failures[0].target, author_key());
        }
        other => panic!("expected UnresolvedReferences, got {other:?}"),
    }
}

#[test]
fn reload_after_m2m_edit_rerenders_owner_twice_and_target_once() {
    let mut schema = ProjectSchema::new(catalog());
    schema.add_model(fixtures::author_def()).unwrap();
    schema.add_model(fixtures::book_def()).unwrap();
    schema
        .add_model(fixtures::simple_def("library", "Tag", &["label"]))
        .unwrap();
    let baseline = schema.registry().unwrap().stats().rendered;

    schema
        .model_mut(&book_key())
        .unwrap()
        .add_field(fixtures::m2m_field("tags", "library", "Tag"))
        .unwrap();
    schema.reload_model(&book_key()).unwrap();

    // Book renders before and after its targets, Tag once in between.
    let registry = schema.registry().unwrap();
    assert_eq!(registry.stats().rendered, baseline + 3);
    let rendered = registry.model(&book_key()).unwrap();
    let edge = rendered
        .field_by_name("tags")
        .unwrap()
        .relation
        .as_ref()
        .unwrap();
    assert!(edge.resolved);
    assert_eq!(edge.kind, RelationKind::ManyToMany);
}

#[test]
fn reload_is_idempotent() {
    let mut schema = ProjectSchema::new(catalog());
    schema.add_model(fixtures::author_def()).unwrap();
    schema.add_model(fixtures::book_def()).unwrap();
    schema.registry().unwrap();

    schema.reload_model(&book_key()).unwrap();
    let after_first = schema.registry().unwrap().stats().rendered;
    schema.reload_model(&book_key()).unwrap();
    let after_second = schema.registry().unwrap().stats().rendered;
    // Same neighborhood each time: one re-render of Book per reload.
    assert_eq!(after_second - after_first, 1);
    assert_eq!(schema.registry().unwrap().len(), 2);
}

#[test]
fn reload_rerenders_types_pointing_at_the_reloaded_key() {
    let mut schema = ProjectSchema::new(catalog());
    schema.add_model(fixtures::author_def()).unwrap();
    schema.add_model(fixtures::book_def()).unwrap();
    let baseline = schema.registry().unwrap().stats().rendered;

    schema
        .model_mut(&author_key())
        .unwrap()
        .add_field(fixtures::text_field("bio"))
        .unwrap();
    schema.reload_model(&author_key()).unwrap();

    let registry = schema.registry().unwrap();
    // Author re-rendered, plus Book which points at it.
    assert_eq!(registry.stats().rendered, baseline + 2);
    assert_eq!(registry.model(&author_key()).unwrap().fields.len(), 2);
}

#[test]
fn edits_only_take_effect_after_reload() {
    let mut schema = ProjectSchema::new(catalog());
    schema.add_model(fixtures::author_def()).unwrap();
    schema.registry().unwrap();

    schema
        .model_mut(&author_key())
        .unwrap()
        .add_field(fixtures::text_field("bio"))
        .unwrap();
    assert_eq!(
        schema.registry().unwrap().model(&author_key()).unwrap().fields.len(),
        1
    );
    schema.reload_model(&author_key()).unwrap();
    assert_eq!(
        schema.registry().unwrap().model(&author_key()).unwrap().fields.len(),
        2
    );
}
