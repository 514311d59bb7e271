//! Project schema snapshots for the Kiln schema engine.
//!
//! A [`ProjectSchema`] aggregates every type description in a project
//! and hands out usable rendered types on demand. Snapshots are the
//! unit of history: cheap to hold, deep-copyable, comparable by
//! content, and able to absorb types rendered outside the project.
//!
//! # Architecture
//!
//! ```text
//! ProjectSchema
//! ├── models: ModelKey → ModelDef (insertion order, the real state)
//! ├── ExternalTypes (shared source + absorbed group labels)
//! ├── substitutable key (tolerated as missing by concrete builds)
//! └── registry: Option<ModelRegistry> (derived, lazily built)
//!     ├── built strict via registry()
//!     ├── rebuilt tolerant via concrete_registry()
//!     └── kept consistent by add/remove/reload
//! ```
//!
//! Everything observable flows from the descriptions. The registry is a
//! cache: equality ignores it, clones deep-copy it only when it already
//! exists, and any edit funnels through a reload that re-renders exactly
//! the affected neighborhood.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod project;

// Public re-exports for the primary API surface.
pub use error::ProjectError;
pub use project::{ExternalTypes, ProjectSchema};
