//! Reusable schema fixtures.
//!
//! Concrete field and manager types for exercising the engine:
//!
//! - [`TextField`], [`IntegerField`], [`BooleanField`] — scalar fields.
//! - [`ForeignKeyField`], [`OneToOneField`], [`ManyToManyField`] —
//!   relation fields with a parseable target in their recipe.
//! - [`FailingField`] — decomposes into a recipe its own builder rejects.
//! - [`PlainManager`] — the default-manager stand-in (does not opt into
//!   snapshots), [`AuditManager`] — an opted-in manager with state.
//!
//! [`catalog`] returns a catalog covering all of the above, with
//! `plain` designated as the default manager under the name `records`.

use std::sync::Arc;

use kiln_core::{
    next_creation_seq, FieldDecl, FieldParts, ManagerDecl, ManagerParts, ModelDef, ModelKey,
    ModelOptions, ReconstructError, Relation, RelationKind, RelationTarget, SchemaCatalog,
    SchemaField, SchemaManager, Value,
};

/// Recipe spelling of a self-reference target.
pub const SELF_TARGET: &str = "self";

fn target_to_value(target: &RelationTarget) -> Value {
    match target {
        RelationTarget::SelfRef => Value::Text(SELF_TARGET.to_string()),
        RelationTarget::Model(key) => Value::Text(key.to_string()),
    }
}

fn target_from_parts(parts: &FieldParts) -> Result<RelationTarget, ReconstructError> {
    let raw = match parts.kwargs.get("to") {
        Some(Value::Text(raw)) => raw,
        _ => {
            return Err(ReconstructError::InvalidParts {
                tag: parts.tag.clone(),
                reason: "missing or non-text 'to' argument".to_string(),
            })
        }
    };
    if raw == SELF_TARGET {
        return Ok(RelationTarget::SelfRef);
    }
    match raw.split_once('.') {
        Some((group, name)) if !group.is_empty() && !name.is_empty() => {
            Ok(RelationTarget::Model(ModelKey::new(group, name)))
        }
        _ => Err(ReconstructError::InvalidParts {
            tag: parts.tag.clone(),
            reason: format!("target '{raw}' is not 'group.name' or '{SELF_TARGET}'"),
        }),
    }
}

fn opt_int_kwarg(parts: &FieldParts, key: &str) -> Result<Option<i64>, ReconstructError> {
    match parts.kwargs.get(key) {
        None => Ok(None),
        Some(Value::Int(n)) => Ok(Some(*n)),
        Some(_) => Err(ReconstructError::InvalidParts {
            tag: parts.tag.clone(),
            reason: format!("'{key}' must be an integer"),
        }),
    }
}

// ── Scalar fields ───────────────────────────────────────────────────────

/// A text field with an optional length cap. Tag: `text`.
#[derive(Debug)]
pub struct TextField {
    pub max_length: Option<i64>,
}

impl TextField {
    pub fn new() -> Self {
        Self { max_length: None }
    }

    pub fn with_max_length(max_length: i64) -> Self {
        Self {
            max_length: Some(max_length),
        }
    }
}

impl Default for TextField {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaField for TextField {
    fn decompose(&self) -> FieldParts {
        let mut parts = FieldParts::new("text");
        if let Some(n) = self.max_length {
            parts = parts.with_kwarg("max_length", n);
        }
        parts
    }
}

/// Field builder for [`TextField`].
pub fn build_text(parts: &FieldParts) -> Result<Box<dyn SchemaField>, ReconstructError> {
    Ok(Box::new(TextField {
        max_length: opt_int_kwarg(parts, "max_length")?,
    }))
}

/// An integer field with an optional default. Tag: `integer`.
#[derive(Debug)]
pub struct IntegerField {
    pub default: Option<i64>,
}

impl IntegerField {
    pub fn new() -> Self {
        Self { default: None }
    }
}

impl Default for IntegerField {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaField for IntegerField {
    fn decompose(&self) -> FieldParts {
        let mut parts = FieldParts::new("integer");
        if let Some(n) = self.default {
            parts = parts.with_kwarg("default", n);
        }
        parts
    }
}

/// Field builder for [`IntegerField`].
pub fn build_integer(parts: &FieldParts) -> Result<Box<dyn SchemaField>, ReconstructError> {
    Ok(Box::new(IntegerField {
        default: opt_int_kwarg(parts, "default")?,
    }))
}

/// A boolean field. Tag: `boolean`.
#[derive(Debug)]
pub struct BooleanField {
    pub default: bool,
}

impl BooleanField {
    pub fn new(default: bool) -> Self {
        Self { default }
    }
}

impl SchemaField for BooleanField {
    fn decompose(&self) -> FieldParts {
        FieldParts::new("boolean").with_kwarg("default", self.default)
    }
}

/// Field builder for [`BooleanField`].
pub fn build_boolean(parts: &FieldParts) -> Result<Box<dyn SchemaField>, ReconstructError> {
    match parts.kwargs.get("default") {
        Some(Value::Bool(b)) => Ok(Box::new(BooleanField { default: *b })),
        _ => Err(ReconstructError::InvalidParts {
            tag: parts.tag.clone(),
            reason: "missing or non-boolean 'default'".to_string(),
        }),
    }
}

// ── Relation fields ─────────────────────────────────────────────────────

/// A many-to-one reference. Tag: `fk`, target under the `to` kwarg.
#[derive(Debug)]
pub struct ForeignKeyField {
    pub target: RelationTarget,
}

impl ForeignKeyField {
    pub fn new(target: RelationTarget) -> Self {
        Self { target }
    }

    /// Reference `group.name`.
    pub fn to(group: &str, name: &str) -> Self {
        Self::new(RelationTarget::Model(ModelKey::new(group, name)))
    }

    /// Reference the owning type.
    pub fn to_self() -> Self {
        Self::new(RelationTarget::SelfRef)
    }
}

impl SchemaField for ForeignKeyField {
    fn decompose(&self) -> FieldParts {
        let mut parts = FieldParts::new("fk");
        parts
            .kwargs
            .insert("to".to_string(), target_to_value(&self.target));
        parts
    }

    fn relation(&self) -> Option<Relation> {
        Some(Relation::new(self.target.clone(), RelationKind::ForeignKey))
    }
}

/// Field builder for [`ForeignKeyField`].
pub fn build_fk(parts: &FieldParts) -> Result<Box<dyn SchemaField>, ReconstructError> {
    Ok(Box::new(ForeignKeyField::new(target_from_parts(parts)?)))
}

/// A one-to-one reference. Tag: `o2o`, target under the `to` kwarg.
#[derive(Debug)]
pub struct OneToOneField {
    pub target: RelationTarget,
}

impl OneToOneField {
    pub fn to(group: &str, name: &str) -> Self {
        Self {
            target: RelationTarget::Model(ModelKey::new(group, name)),
        }
    }
}

impl SchemaField for OneToOneField {
    fn decompose(&self) -> FieldParts {
        let mut parts = FieldParts::new("o2o");
        parts
            .kwargs
            .insert("to".to_string(), target_to_value(&self.target));
        parts
    }

    fn relation(&self) -> Option<Relation> {
        Some(Relation::new(self.target.clone(), RelationKind::OneToOne))
    }
}

/// Field builder for [`OneToOneField`].
pub fn build_o2o(parts: &FieldParts) -> Result<Box<dyn SchemaField>, ReconstructError> {
    Ok(Box::new(OneToOneField {
        target: target_from_parts(parts)?,
    }))
}

/// A many-to-many association. Tag: `m2m`, target under the `to` kwarg.
#[derive(Debug)]
pub struct ManyToManyField {
    pub target: RelationTarget,
}

impl ManyToManyField {
    pub fn to(group: &str, name: &str) -> Self {
        Self {
            target: RelationTarget::Model(ModelKey::new(group, name)),
        }
    }

    pub fn to_self() -> Self {
        Self {
            target: RelationTarget::SelfRef,
        }
    }
}

impl SchemaField for ManyToManyField {
    fn decompose(&self) -> FieldParts {
        let mut parts = FieldParts::new("m2m");
        parts
            .kwargs
            .insert("to".to_string(), target_to_value(&self.target));
        parts
    }

    fn relation(&self) -> Option<Relation> {
        Some(Relation::new(self.target.clone(), RelationKind::ManyToMany))
    }
}

/// Field builder for [`ManyToManyField`].
pub fn build_m2m(parts: &FieldParts) -> Result<Box<dyn SchemaField>, ReconstructError> {
    Ok(Box::new(ManyToManyField {
        target: target_from_parts(parts)?,
    }))
}

/// Decomposes into a recipe its own builder rejects. Tag: `failing`.
///
/// Useful for testing that rebuild failures surface with field context
/// from deep inside clones, renders, and imports.
#[derive(Debug)]
pub struct FailingField;

impl SchemaField for FailingField {
    fn decompose(&self) -> FieldParts {
        FieldParts::new("failing")
    }
}

/// Field builder for [`FailingField`] — always rejects.
pub fn build_failing(parts: &FieldParts) -> Result<Box<dyn SchemaField>, ReconstructError> {
    Err(ReconstructError::InvalidParts {
        tag: parts.tag.clone(),
        reason: "deliberately unreconstructable".to_string(),
    })
}

// ── Managers ────────────────────────────────────────────────────────────

/// The default-manager stand-in. Tag: `plain`.
///
/// Does not opt into snapshots, mirroring how a bare helper object
/// carries no schema information.
#[derive(Debug)]
pub struct PlainManager {
    seq: u64,
}

impl PlainManager {
    pub fn new() -> Self {
        Self {
            seq: next_creation_seq(),
        }
    }
}

impl Default for PlainManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaManager for PlainManager {
    fn decompose(&self) -> ManagerParts {
        ManagerParts::new("plain")
    }

    fn creation_seq(&self) -> u64 {
        self.seq
    }
}

/// Manager builder for [`PlainManager`].
pub fn build_plain(_parts: &ManagerParts) -> Result<Arc<dyn SchemaManager>, ReconstructError> {
    Ok(Arc::new(PlainManager::new()))
}

/// An opted-in manager with one knob. Tag: `audit`.
#[derive(Debug)]
pub struct AuditManager {
    pub window: i64,
    seq: u64,
}

impl AuditManager {
    pub fn new(window: i64) -> Self {
        Self {
            window,
            seq: next_creation_seq(),
        }
    }
}

impl SchemaManager for AuditManager {
    fn decompose(&self) -> ManagerParts {
        ManagerParts::new("audit").with_kwarg("window", self.window)
    }

    fn creation_seq(&self) -> u64 {
        self.seq
    }

    fn in_migrations(&self) -> bool {
        true
    }
}

/// Manager builder for [`AuditManager`].
pub fn build_audit(parts: &ManagerParts) -> Result<Arc<dyn SchemaManager>, ReconstructError> {
    match parts.kwargs.get("window") {
        Some(Value::Int(window)) => Ok(Arc::new(AuditManager::new(*window))),
        _ => Err(ReconstructError::InvalidParts {
            tag: parts.tag.clone(),
            reason: "missing or non-integer 'window'".to_string(),
        }),
    }
}

// ── Catalog and declaration helpers ─────────────────────────────────────

/// A catalog covering every fixture tag, with `plain` as the default
/// manager under the attachment name `records`.
pub fn catalog() -> SchemaCatalog {
    let mut catalog = SchemaCatalog::new();
    catalog.register_field("text", build_text).unwrap();
    catalog.register_field("integer", build_integer).unwrap();
    catalog.register_field("boolean", build_boolean).unwrap();
    catalog.register_field("fk", build_fk).unwrap();
    catalog.register_field("o2o", build_o2o).unwrap();
    catalog.register_field("m2m", build_m2m).unwrap();
    catalog.register_field("failing", build_failing).unwrap();
    catalog.register_manager("plain", build_plain).unwrap();
    catalog.register_manager("audit", build_audit).unwrap();
    catalog.set_default_manager("plain", "records").unwrap();
    catalog
}

/// A text field declaration.
pub fn text_field(name: &str) -> FieldDecl {
    FieldDecl::new(name, Box::new(TextField::new()))
}

/// An integer field declaration.
pub fn integer_field(name: &str) -> FieldDecl {
    FieldDecl::new(name, Box::new(IntegerField::new()))
}

/// A foreign-key declaration referencing `group.model`.
pub fn fk_field(name: &str, group: &str, model: &str) -> FieldDecl {
    FieldDecl::new(name, Box::new(ForeignKeyField::to(group, model)))
}

/// A many-to-many declaration referencing `group.model`.
pub fn m2m_field(name: &str, group: &str, model: &str) -> FieldDecl {
    FieldDecl::new(name, Box::new(ManyToManyField::to(group, model)))
}

/// A plain-manager attachment.
pub fn plain_manager(name: &str) -> ManagerDecl {
    ManagerDecl::new(name, Arc::new(PlainManager::new()))
}

/// An audit-manager attachment.
pub fn audit_manager(name: &str, window: i64) -> ManagerDecl {
    ManagerDecl::new(name, Arc::new(AuditManager::new(window)))
}

/// A description with only text fields and defaults everywhere else.
pub fn simple_def(group: &str, name: &str, field_names: &[&str]) -> ModelDef {
    ModelDef::new(
        group,
        name,
        field_names.iter().map(|n| text_field(n)).collect(),
        ModelOptions::default(),
        vec![],
        vec![],
    )
    .unwrap()
}

/// `library.Author` with a name field.
pub fn author_def() -> ModelDef {
    simple_def("library", "Author", &["name"])
}

/// `library.Book` with a title and a foreign key to `library.Author`.
pub fn book_def() -> ModelDef {
    ModelDef::new(
        "library",
        "Book",
        vec![text_field("title"), fk_field("author", "library", "Author")],
        ModelOptions::default(),
        vec![],
        vec![],
    )
    .unwrap()
}
