//! Isolated type registry for the Kiln schema engine.
//!
//! A [`ModelRegistry`] turns declarative descriptions into rendered
//! types and owns everything it produced: the group and model tables,
//! the pending-lookup table for forward references, and a cached
//! relation graph. Registries are disposable — a snapshot rebuilds one
//! whenever its descriptions change shape, and two registries never
//! share mutable state.
//!
//! # Architecture
//!
//! ```text
//! render_all (fixed-point worklist over bases)
//! └── render_and_register (one description)
//!     ├── rebuild fields/managers via SchemaCatalog
//!     ├── resolve relation edges, queue PendingLookups obligations
//!     └── register → drain obligations targeting the new key
//!
//! ModelRegistry
//! ├── groups → GroupEntry → RenderedModel tables (insertion order)
//! ├── PendingLookups (target → consumer obligations)
//! ├── RelationGraph (reverse adjacency, rebuilt lazily)
//! └── RenderStats (passes / rendered / resolved counters)
//! ```
//!
//! The build tolerates any input order: a description whose bases have
//! not rendered yet is retried on the next pass, and a pass that makes
//! no progress fails naming every stuck description. Dangling relation
//! edges are collected after the fixed point and reported in a single
//! aggregate error.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod graph;
pub mod pending;
pub mod registry;
pub mod render;

// Public re-exports for the primary API surface.
pub use error::{RenderError, UnresolvedReference};
pub use graph::RelationGraph;
pub use pending::{Obligation, PendingLookups};
pub use registry::{GroupEntry, ModelRegistry};
pub use render::{RenderStats, ORDINAL_FIELD};
