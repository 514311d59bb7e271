//! Test utilities and fixture types for Kiln development.
//!
//! Provides concrete [`SchemaField`](kiln_core::SchemaField) and
//! [`SchemaManager`](kiln_core::SchemaManager) implementations, a fully
//! populated catalog, and description builders for common test shapes.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

pub use fixtures::{
    audit_manager, author_def, book_def, build_audit, build_boolean, build_failing, build_fk,
    build_integer, build_m2m, build_o2o, build_plain, build_text, catalog, fk_field, integer_field,
    m2m_field, plain_manager, simple_def, text_field, AuditManager, BooleanField, FailingField,
    ForeignKeyField, IntegerField, ManyToManyField, OneToOneField, PlainManager, TextField,
    SELF_TARGET,
};
