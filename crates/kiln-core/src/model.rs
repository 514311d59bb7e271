//! Declarative type descriptions.
//!
//! A [`ModelDef`] is plain data about one type: its declared fields in
//! order, its options, its base chain, and its attached managers. It holds
//! no rendered state and no references into any registry, which is what
//! makes whole-project snapshots cheap to hold and safe to edit.

use std::fmt;
use std::sync::Arc;

use crate::catalog::SchemaCatalog;
use crate::error::DefError;
use crate::field::{FieldParts, SchemaField};
use crate::id::ModelKey;
use crate::manager::{ManagerParts, SchemaManager};
use crate::options::ModelOptions;

/// One entry in a type's base chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BaseRef {
    /// The implicit root ancestor every concrete type derives from.
    Root,
    /// Another described type, referenced by key.
    Model(ModelKey),
}

impl fmt::Display for BaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "<root>"),
            Self::Model(key) => write!(f, "{key}"),
        }
    }
}

/// A named field declaration.
#[derive(Debug)]
pub struct FieldDecl {
    /// Field name, unique within the owning type.
    pub name: String,
    /// The field blueprint.
    pub schema: Box<dyn SchemaField>,
}

impl FieldDecl {
    /// A declaration binding `name` to `schema`.
    pub fn new(name: impl Into<String>, schema: Box<dyn SchemaField>) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Decomposed parts of the declared field.
    pub fn parts(&self) -> FieldParts {
        self.schema.decompose()
    }
}

/// A named manager attachment.
///
/// The instance is shared by reference: managers are immutable once
/// constructed, so clones of a description alias the same object.
#[derive(Clone, Debug)]
pub struct ManagerDecl {
    /// Attachment name, unique within the owning type.
    pub name: String,
    /// The shared manager instance.
    pub instance: Arc<dyn SchemaManager>,
}

impl ManagerDecl {
    /// A declaration attaching `instance` under `name`.
    pub fn new(name: impl Into<String>, instance: Arc<dyn SchemaManager>) -> Self {
        Self {
            name: name.into(),
            instance,
        }
    }

    /// Decomposed parts of the attached manager.
    pub fn parts(&self) -> ManagerParts {
        self.instance.decompose()
    }
}

/// A declarative description of one type.
///
/// Field order is meaning-bearing and preserved through every clone,
/// render, and import. Equality compares decomposed parts, not instances:
/// two descriptions are equal exactly when they would render identically.
#[derive(Debug)]
pub struct ModelDef {
    group: String,
    name: String,
    fields: Vec<FieldDecl>,
    options: ModelOptions,
    bases: Vec<BaseRef>,
    managers: Vec<ManagerDecl>,
}

impl ModelDef {
    /// Validate and build a description.
    ///
    /// `name` keeps its display casing; identity (see [`ModelDef::key`])
    /// lowercases it. An empty base list is replaced by `[BaseRef::Root]`.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        fields: Vec<FieldDecl>,
        options: ModelOptions,
        mut bases: Vec<BaseRef>,
        managers: Vec<ManagerDecl>,
    ) -> Result<Self, DefError> {
        let group = group.into();
        let name = name.into();
        let key = ModelKey::new(&group, &name);

        // 1. Field names must be unique within the type.
        for (i, decl) in fields.iter().enumerate() {
            if fields[..i].iter().any(|other| other.name == decl.name) {
                return Err(DefError::DuplicateField {
                    model: key,
                    field: decl.name.clone(),
                });
            }
        }

        // 2. Manager names must be unique within the type.
        for (i, decl) in managers.iter().enumerate() {
            if managers[..i].iter().any(|other| other.name == decl.name) {
                return Err(DefError::DuplicateManager {
                    model: key,
                    manager: decl.name.clone(),
                });
            }
        }

        // 3. Every type derives from the root; no declared bases means the
        //    root directly.
        if bases.is_empty() {
            bases.push(BaseRef::Root);
        }

        Ok(Self {
            group,
            name,
            fields,
            options,
            bases,
            managers,
        })
    }

    /// The owning group label.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The display-cased type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The identity key: `(group, lowercased name)`.
    pub fn key(&self) -> ModelKey {
        ModelKey::new(&self.group, &self.name)
    }

    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    /// The option settings.
    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Mutable access to the option settings.
    ///
    /// Options carry no cross-field invariants, so editing them directly
    /// on a cloned description is the intended workflow.
    pub fn options_mut(&mut self) -> &mut ModelOptions {
        &mut self.options
    }

    /// The base chain, never empty.
    pub fn bases(&self) -> &[BaseRef] {
        &self.bases
    }

    /// Attached managers, in declaration order.
    pub fn managers(&self) -> &[ManagerDecl] {
        &self.managers
    }

    /// Look up a declared field by exact name.
    pub fn field_by_name(&self, name: &str) -> Result<&dyn SchemaField, DefError> {
        self.fields
            .iter()
            .find(|decl| decl.name == name)
            .map(|decl| decl.schema.as_ref())
            .ok_or_else(|| DefError::FieldNotFound {
                model: self.key(),
                field: name.to_string(),
            })
    }

    /// Append a field declaration, rejecting duplicate names.
    pub fn add_field(&mut self, decl: FieldDecl) -> Result<(), DefError> {
        if self.fields.iter().any(|other| other.name == decl.name) {
            return Err(DefError::DuplicateField {
                model: self.key(),
                field: decl.name,
            });
        }
        self.fields.push(decl);
        Ok(())
    }

    /// Remove a field declaration by name, returning it.
    pub fn remove_field(&mut self, name: &str) -> Result<FieldDecl, DefError> {
        let index = self
            .fields
            .iter()
            .position(|decl| decl.name == name)
            .ok_or_else(|| DefError::FieldNotFound {
                model: self.key(),
                field: name.to_string(),
            })?;
        Ok(self.fields.remove(index))
    }

    /// Rebuild every declared field through `catalog`.
    ///
    /// This is the decompose/rebuild round trip that deep copies and
    /// rendering rely on. Failures name the exact field.
    pub fn rebuilt_fields(&self, catalog: &SchemaCatalog) -> Result<Vec<FieldDecl>, DefError> {
        let mut rebuilt = Vec::with_capacity(self.fields.len());
        for decl in &self.fields {
            let schema = catalog.rebuild_field(&decl.parts()).map_err(|source| {
                DefError::FieldRebuild {
                    model: self.key(),
                    field: decl.name.clone(),
                    source,
                }
            })?;
            rebuilt.push(FieldDecl::new(decl.name.clone(), schema));
        }
        Ok(rebuilt)
    }

    /// Deep-copy this description.
    ///
    /// Fields round-trip through `catalog`; options and bases are value
    /// copies; manager instances are shared.
    pub fn try_clone(&self, catalog: &SchemaCatalog) -> Result<Self, DefError> {
        Ok(Self {
            group: self.group.clone(),
            name: self.name.clone(),
            fields: self.rebuilt_fields(catalog)?,
            options: self.options.clone(),
            bases: self.bases.clone(),
            managers: self.managers.clone(),
        })
    }
}

impl PartialEq for ModelDef {
    fn eq(&self, other: &Self) -> bool {
        self.group == other.group
            && self.name == other.name
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.name == b.name && a.parts() == b.parts())
            && self.options == other.options
            && self.bases == other.bases
            && self.managers.len() == other.managers.len()
            && self
                .managers
                .iter()
                .zip(&other.managers)
                .all(|(a, b)| a.name == b.name && a.parts() == b.parts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconstructError;
    use crate::manager::next_creation_seq;
    use crate::value::Value;

    #[derive(Debug)]
    struct StubField {
        parts: FieldParts,
    }

    impl SchemaField for StubField {
        fn decompose(&self) -> FieldParts {
            self.parts.clone()
        }
    }

    fn stub(tag: &str) -> Box<dyn SchemaField> {
        Box::new(StubField {
            parts: FieldParts::new(tag),
        })
    }

    fn build_stub(parts: &FieldParts) -> Result<Box<dyn SchemaField>, ReconstructError> {
        Ok(Box::new(StubField {
            parts: parts.clone(),
        }))
    }

    #[derive(Debug)]
    struct StubManager {
        seq: u64,
    }

    impl SchemaManager for StubManager {
        fn decompose(&self) -> ManagerParts {
            ManagerParts::new("stub")
        }

        fn creation_seq(&self) -> u64 {
            self.seq
        }
    }

    fn manager(name: &str) -> ManagerDecl {
        ManagerDecl::new(
            name,
            Arc::new(StubManager {
                seq: next_creation_seq(),
            }),
        )
    }

    fn catalog() -> SchemaCatalog {
        let mut catalog = SchemaCatalog::new();
        catalog.register_field("text", build_stub).unwrap();
        catalog.register_field("int", build_stub).unwrap();
        catalog.register_field("stub", build_stub).unwrap();
        catalog
    }

    fn book() -> ModelDef {
        ModelDef::new(
            "library",
            "Book",
            vec![
                FieldDecl::new("title", stub("text")),
                FieldDecl::new("pages", stub("int")),
            ],
            ModelOptions::default(),
            vec![],
            vec![manager("records")],
        )
        .unwrap()
    }

    #[test]
    fn duplicate_field_rejected() {
        let result = ModelDef::new(
            "library",
            "Book",
            vec![
                FieldDecl::new("title", stub("text")),
                FieldDecl::new("title", stub("int")),
            ],
            ModelOptions::default(),
            vec![],
            vec![],
        );
        match result {
            Err(DefError::DuplicateField { model, field }) => {
                assert_eq!(model, ModelKey::new("library", "Book"));
                assert_eq!(field, "title");
            }
            other => panic!("expected DuplicateField, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_manager_rejected() {
        let result = ModelDef::new(
            "library",
            "Book",
            vec![],
            ModelOptions::default(),
            vec![],
            vec![manager("records"), manager("records")],
        );
        match result {
            Err(DefError::DuplicateManager { manager, .. }) => assert_eq!(manager, "records"),
            other => panic!("expected DuplicateManager, got {other:?}"),
        }
    }

    #[test]
    fn empty_bases_become_root() {
        let def = book();
        assert_eq!(def.bases(), &[BaseRef::Root]);
    }

    #[test]
    fn declared_bases_kept() {
        let def = ModelDef::new(
            "library",
            "Novel",
            vec![],
            ModelOptions::default(),
            vec![BaseRef::Model(ModelKey::new("library", "Book"))],
            vec![],
        )
        .unwrap();
        assert_eq!(
            def.bases(),
            &[BaseRef::Model(ModelKey::new("library", "Book"))]
        );
    }

    #[test]
    fn key_lowercases_but_name_preserves_case() {
        let def = book();
        assert_eq!(def.name(), "Book");
        assert_eq!(def.key(), ModelKey::new("library", "book"));
    }

    #[test]
    fn field_lookup_by_name() {
        let def = book();
        assert_eq!(def.field_by_name("pages").unwrap().decompose().tag, "int");
        match def.field_by_name("isbn") {
            Err(DefError::FieldNotFound { field, .. }) => assert_eq!(field, "isbn"),
            other => panic!("expected FieldNotFound, got {other:?}"),
        }
    }

    #[test]
    fn add_field_rejects_duplicates() {
        let mut def = book();
        def.add_field(FieldDecl::new("isbn", stub("text"))).unwrap();
        assert_eq!(def.fields().len(), 3);
        match def.add_field(FieldDecl::new("isbn", stub("text"))) {
            Err(DefError::DuplicateField { field, .. }) => assert_eq!(field, "isbn"),
            other => panic!("expected DuplicateField, got {other:?}"),
        }
    }

    #[test]
    fn remove_field_returns_declaration() {
        let mut def = book();
        let removed = def.remove_field("pages").unwrap();
        assert_eq!(removed.name, "pages");
        assert_eq!(def.fields().len(), 1);
        match def.remove_field("pages") {
            Err(DefError::FieldNotFound { field, .. }) => assert_eq!(field, "pages"),
            other => panic!("expected FieldNotFound, got {other:?}"),
        }
    }

    #[test]
    fn clone_is_equal_and_independent() {
        let original = book();
        let mut cloned = original.try_clone(&catalog()).unwrap();
        assert_eq!(original, cloned);

        cloned
            .add_field(FieldDecl::new("isbn", stub("text")))
            .unwrap();
        cloned.options_mut().table_name = Some("books".to_string());
        assert_eq!(original.fields().len(), 2);
        assert!(original.options().table_name.is_none());
        assert_ne!(original, cloned);
    }

    #[test]
    fn clone_fails_on_unknown_tag() {
        let def = ModelDef::new(
            "library",
            "Book",
            vec![FieldDecl::new("title", stub("mystery"))],
            ModelOptions::default(),
            vec![],
            vec![],
        )
        .unwrap();
        match def.try_clone(&catalog()) {
            Err(DefError::FieldRebuild { field, source, .. }) => {
                assert_eq!(field, "title");
                assert_eq!(
                    source,
                    ReconstructError::UnknownFieldTag {
                        tag: "mystery".to_string()
                    }
                );
            }
            other => panic!("expected FieldRebuild, got {other:?}"),
        }
    }

    #[test]
    fn equality_tracks_field_order() {
        let a = ModelDef::new(
            "library",
            "Book",
            vec![
                FieldDecl::new("title", stub("text")),
                FieldDecl::new("pages", stub("int")),
            ],
            ModelOptions::default(),
            vec![],
            vec![],
        )
        .unwrap();
        let b = ModelDef::new(
            "library",
            "Book",
            vec![
                FieldDecl::new("pages", stub("int")),
                FieldDecl::new("title", stub("text")),
            ],
            ModelOptions::default(),
            vec![],
            vec![],
        )
        .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn equality_tracks_field_parts() {
        let mut long = book();
        long.remove_field("title").unwrap();
        long.add_field(FieldDecl::new(
            "title",
            Box::new(StubField {
                parts: FieldParts::new("text").with_kwarg("max_length", Value::Int(80)),
            }),
        ))
        .unwrap();
        assert_ne!(book(), long);
    }

    #[test]
    fn equality_ignores_manager_instance_identity() {
        let a = ModelDef::new(
            "library",
            "Book",
            vec![],
            ModelOptions::default(),
            vec![],
            vec![manager("records")],
        )
        .unwrap();
        let b = ModelDef::new(
            "library",
            "Book",
            vec![],
            ModelOptions::default(),
            vec![],
            vec![manager("records")],
        )
        .unwrap();
        // Distinct instances with distinct creation order, same parts.
        assert_eq!(a, b);
    }
}
