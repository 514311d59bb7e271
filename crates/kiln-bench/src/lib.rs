//! Benchmark profiles and utilities for the Kiln schema engine.
//!
//! Provides pre-built snapshot profiles for benchmarking and examples:
//!
//! - [`reference_schema`]: 4 groups x 25 types joined into one relation chain
//! - [`stress_schema`]: 10 groups x 100 types, the same shape at 10x the size
//! - [`chained_bases`]: a base chain for worst-case worklist ordering

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use kiln_core::{BaseRef, ModelDef, ModelKey, ModelOptions, SchemaCatalog};
use kiln_project::ProjectSchema;
use kiln_test_utils::fixtures;

/// The fixture catalog every profile renders through.
pub fn bench_catalog() -> Arc<SchemaCatalog> {
    Arc::new(fixtures::catalog())
}

/// Build a snapshot of `groups` groups with `per_group` types each.
///
/// Every type carries two scalar fields. Each type after the first also
/// holds a foreign key to the type added before it, across group
/// boundaries, so rendering resolves one relation chain spanning the
/// whole project.
pub fn schema_with(groups: usize, per_group: usize) -> ProjectSchema {
    let mut schema = ProjectSchema::new(bench_catalog());
    let mut previous: Option<(String, String)> = None;
    for g in 0..groups {
        let group = format!("group{g}");
        for i in 0..per_group {
            let name = format!("Type{i}");
            let mut fields = vec![
                fixtures::text_field("label"),
                fixtures::integer_field("rank"),
            ];
            if let Some((prev_group, prev_name)) = &previous {
                fields.push(fixtures::fk_field("prev", prev_group, prev_name));
            }
            let def = ModelDef::new(
                group.as_str(),
                name.as_str(),
                fields,
                ModelOptions::default(),
                vec![],
                vec![],
            )
            .unwrap();
            schema.add_model(def).unwrap();
            previous = Some((group.clone(), name));
        }
    }
    schema
}

/// Build the reference profile: 4 groups x 25 types (100 descriptions).
pub fn reference_schema() -> ProjectSchema {
    schema_with(4, 25)
}

/// Build the stress profile: 10 groups x 100 types (1000 descriptions).
pub fn stress_schema() -> ProjectSchema {
    schema_with(10, 100)
}

/// Descriptions forming a base chain of the given depth.
///
/// `Level0` has no explicit base; every later level inherits the one
/// before it. Feeding these to a build in reverse order exercises the
/// worklist's worst case, where exactly one level settles per pass.
pub fn chained_bases(depth: usize) -> Vec<ModelDef> {
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
