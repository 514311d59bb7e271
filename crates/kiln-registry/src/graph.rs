//! Reverse relation adjacency over a registry's rendered types.
//!
//! Built on demand from the current rendered state and cached by the
//! registry until the next register/unregister. Adjacency covers every
//! relationship edge, resolved or not: an unresolved edge is still a
//! pointer for reload purposes.

use indexmap::IndexMap;
use kiln_core::{ModelKey, RenderedModel};
use smallvec::SmallVec;

type Neighbors = SmallVec<[ModelKey; 4]>;

/// Reverse adjacency: target key to the types pointing at it.
#[derive(Clone, Debug, Default)]
pub struct RelationGraph {
    reverse: IndexMap<ModelKey, Neighbors>,
}

impl RelationGraph {
    /// Build the graph from every rendered type the iterator yields.
    pub fn build<'a>(models: impl Iterator<Item = &'a RenderedModel>) -> Self {
        let mut reverse: IndexMap<ModelKey, Neighbors> = IndexMap::new();
        for model in models {
            let consumer = model.key();
            for (_, edge) in model.relation_edges() {
                let neighbors = reverse.entry(edge.target.clone()).or_default();
                if !neighbors.contains(&consumer) {
                    neighbors.push(consumer.clone());
                }
            }
        }
        Self { reverse }
    }

    /// Types with at least one edge pointing at `key`, in discovery order.
    pub fn related_to(&self, key: &ModelKey) -> &[ModelKey] {
        self.reverse
            .get(key)
            .map(|neighbors| neighbors.as_slice())
            .unwrap_or(&[])
    }

    /// Number of keys that have inbound edges.
    pub fn target_count(&self) -> usize {
        self.reverse.len()
    }
}
