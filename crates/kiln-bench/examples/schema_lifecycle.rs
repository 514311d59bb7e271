//! End-to-end snapshot lifecycle example.
//!
//! Demonstrates: describe types → build a registry → edit and reload →
//! deep-copy → import a description back out.

use kiln_bench::reference_schema;
use kiln_core::ModelKey;
use kiln_test_utils::fixtures;

fn main() {
    println!("=== Kiln Snapshot Lifecycle Example ===\n");

    let mut schema = reference_schema();
    println!("Described {} types", schema.len());

    // --- Build ---
    {
        let registry = schema.registry().unwrap();
        println!(
            "Built registry: {} types in {} passes, {} forward references back-filled",
            registry.len(),
            registry.stats().passes,
            registry.stats().resolved_references,
        );
    }

    // --- Edit and reload ---
    let key = ModelKey::new("group1", "Type12");
    schema
        .model_mut(&key)
        .unwrap()
        .add_field(fixtures::integer_field("revision"))
        .unwrap();
    schema.reload_model(&key).unwrap();
    let rendered_fields = schema.registry().unwrap().model(&key).unwrap().fields.len();
    println!("Reloaded {key}: now {rendered_fields} rendered fields");

    // --- Deep copy ---
    let copy = schema.try_clone().unwrap();
    println!(
        "Deep copy holds {} descriptions, equal to the original: {}",
        copy.len(),
        copy == schema,
    );

    // --- Import a description back out ---
    let described = schema.registry().unwrap().describe(&key, false).unwrap();
    println!(
        "Imported {key} back as a description with {} declared fields",
        described.fields().len(),
    );

    println!("Done.");
}
