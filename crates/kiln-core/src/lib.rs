//! Core types and traits for the Kiln schema engine.
//!
//! Everything here is plain data plus two small protocols: how a field or
//! manager decomposes into a portable recipe, and how a catalog rebuilds
//! one from it. Descriptions ([`ModelDef`]) never touch rendered state;
//! rendered records ([`RenderedModel`]) never embed each other. The
//! stateful machinery lives in the registry and project crates.
//!
//! # Architecture
//!
//! ```text
//! ModelDef (description: fields / options / bases / managers)
//! ├── FieldDecl → dyn SchemaField → FieldParts   (decompose)
//! ├── ManagerDecl → dyn SchemaManager → ManagerParts
//! ├── ModelOptions (typed, canonical option set)
//! └── BaseRef (Root | Model(ModelKey))
//!
//! SchemaCatalog (tag → builder tables)           (rebuild)
//! RenderedModel (concrete record: field slots + resolved edges)
//! ModelSource  (boundary to types rendered elsewhere)
//! ```
//!
//! Deep copies, rendering, and importing all round-trip through
//! decompose/rebuild, so catalog coverage of every tag in use is load
//! bearing for the whole engine.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod field;
pub mod id;
pub mod manager;
pub mod model;
pub mod options;
pub mod rendered;
pub mod source;
pub mod value;

// Public re-exports for the primary API surface.
pub use catalog::{FieldBuilder, ManagerBuilder, SchemaCatalog};
pub use error::{DefError, ReconstructError};
pub use field::{FieldParts, Relation, RelationKind, RelationTarget, SchemaField};
pub use id::ModelKey;
pub use manager::{next_creation_seq, ManagerParts, SchemaManager};
pub use model::{BaseRef, FieldDecl, ManagerDecl, ModelDef};
pub use options::ModelOptions;
pub use rendered::{RelationEdge, RenderedField, RenderedModel};
pub use source::ModelSource;
pub use value::Value;
