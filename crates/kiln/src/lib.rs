//! Kiln: a declarative schema state engine.
//!
//! Kiln keeps a project's data model as plain descriptions — ordered
//! fields, options, bases, and managers per type — and renders them on
//! demand into registries of usable types. Descriptions are cheap to
//! copy, compare, and edit; rendering resolves bases and relationships
//! across the whole project at once.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Kiln sub-crates. For most users, adding `kiln` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use kiln::prelude::*;
//!
//! // A minimal text field whose recipe is just its tag.
//! #[derive(Debug)]
//! struct TextField;
//!
//! impl SchemaField for TextField {
//!     fn decompose(&self) -> FieldParts {
//!         FieldParts::new("text")
//!     }
//! }
//!
//! fn build_text(_parts: &FieldParts) -> Result<Box<dyn SchemaField>, ReconstructError> {
//!     Ok(Box::new(TextField))
//! }
//!
//! // A catalog that can rebuild every tag the project uses.
//! let mut catalog = SchemaCatalog::new();
//! catalog.register_field("text", build_text).unwrap();
//!
//! // Describe `library.Author` and add it to a snapshot.
//! let author = ModelDef::new(
//!     "library",
//!     "Author",
//!     vec![FieldDecl::new("name", Box::new(TextField))],
//!     ModelOptions::default(),
//!     vec![],
//!     vec![],
//! )
//! .unwrap();
//! let mut schema = ProjectSchema::new(Arc::new(catalog));
//! schema.add_model(author).unwrap();
//!
//! // Rendering is lazy: the registry materializes usable types on first
//! // access and is kept consistent by later edits.
//! let registry = schema.registry().unwrap();
//! assert_eq!(registry.len(), 1);
//! assert!(registry.model(&ModelKey::new("library", "Author")).is_some());
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `kiln-core` | Descriptions, recipes, the catalog, core traits |
//! | [`registry`] | `kiln-registry` | Fixed-point rendering, registries, pending lookups |
//! | [`project`] | `kiln-project` | The project-wide snapshot and incremental reloads |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Descriptions, recipes, the catalog, and core traits (`kiln-core`).
///
/// Contains [`types::ModelDef`], the [`types::SchemaField`] and
/// [`types::SchemaManager`] extension points, the
/// [`types::SchemaCatalog`] they register in, and the
/// [`types::ModelSource`] boundary to already-rendered types.
pub use kiln_core as types;

/// Fixed-point rendering and the registry of usable types
/// (`kiln-registry`).
///
/// [`registry::ModelRegistry`] holds rendered types grouped by label,
/// tracks unresolved relationships in [`registry::PendingLookups`], and
/// answers reverse-relation queries through its relation graph.
pub use kiln_registry as registry;

/// The project-wide snapshot (`kiln-project`).
///
/// [`project::ProjectSchema`] aggregates descriptions, builds registries
/// lazily, and keeps a built registry consistent through add, remove,
/// and reload.
pub use kiln_project as project;

/// Common imports for typical Kiln usage.
///
/// ```rust
/// use kiln::prelude::*;
/// ```
///
/// This imports the most frequently used types: descriptions and their
/// parts, the catalog, both extension traits, the registry, and the
/// snapshot.
pub mod prelude {
    // Descriptions, recipes, and the catalog
    pub use kiln_core::{
        BaseRef, FieldDecl, FieldParts, ManagerDecl, ManagerParts, ModelDef, ModelKey,
        ModelOptions, ModelSource, Relation, RelationKind, RelationTarget, SchemaCatalog,
        SchemaField, SchemaManager, Value,
    };

    // Errors
    pub use kiln_core::{DefError, ReconstructError};
    pub use kiln_project::ProjectError;
    pub use kiln_registry::RenderError;

    // Rendered types and the registry
    pub use kiln_core::{RenderedField, RenderedModel};
    pub use kiln_registry::{ModelRegistry, RenderStats};

    // Snapshots
    pub use kiln_project::{ExternalTypes, ProjectSchema};
}
