//! Error types for the core description and reconstruction layer.
//!
//! Organized by concern: [`ReconstructError`] covers the decompose/rebuild
//! protocol and catalog lookups, [`DefError`] covers structural validation
//! and field access on type descriptions.

use std::error::Error;
use std::fmt;

use crate::id::ModelKey;

/// Errors from the reconstruction protocol and the capability catalog.
///
/// Returned by [`SchemaCatalog`](crate::catalog::SchemaCatalog) lookups and
/// by builders that reject their input parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconstructError {
    /// No field builder is registered for the given tag.
    UnknownFieldTag {
        /// The unrecognized tag.
        tag: String,
    },
    /// No manager builder is registered for the given tag.
    UnknownManagerTag {
        /// The unrecognized tag.
        tag: String,
    },
    /// A builder is already registered under this tag.
    DuplicateTag {
        /// The colliding tag.
        tag: String,
    },
    /// A default manager was requested but none is designated.
    NoDefaultManager,
    /// A builder rejected the decomposed parts it was given.
    InvalidParts {
        /// Tag of the builder that rejected the parts.
        tag: String,
        /// Human-readable description of the problem.
        reason: String,
    },
}

impl fmt::Display for ReconstructError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFieldTag { tag } => {
                write!(f, "no field builder registered for tag '{tag}'")
            }
            Self::UnknownManagerTag { tag } => {
                write!(f, "no manager builder registered for tag '{tag}'")
            }
            Self::DuplicateTag { tag } => {
                write!(f, "a builder is already registered for tag '{tag}'")
            }
            Self::NoDefaultManager => write!(f, "no default manager is designated"),
            Self::InvalidParts { tag, reason } => {
                write!(f, "builder for tag '{tag}' rejected its parts: {reason}")
            }
        }
    }
}

impl Error for ReconstructError {}

/// Errors from constructing, cloning, or querying a type description.
///
/// Rebuild variants carry the owning model and member name so a failure
/// deep inside a clone or import names the exact offender.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefError {
    /// Two declared fields share a name.
    DuplicateField {
        /// The model being constructed.
        model: ModelKey,
        /// The colliding field name.
        field: String,
    },
    /// Two attached managers share a name.
    DuplicateManager {
        /// The model being constructed.
        model: ModelKey,
        /// The colliding manager name.
        manager: String,
    },
    /// No declared field has the requested name.
    FieldNotFound {
        /// The model that was searched.
        model: ModelKey,
        /// The missing field name.
        field: String,
    },
    /// A field failed to rebuild from its decomposed parts.
    FieldRebuild {
        /// The model owning the field.
        model: ModelKey,
        /// Name of the failing field.
        field: String,
        /// The underlying protocol error.
        source: ReconstructError,
    },
    /// A manager failed to rebuild from its decomposed parts.
    ManagerRebuild {
        /// The model owning the manager.
        model: ModelKey,
        /// Name of the failing manager.
        manager: String,
        /// The underlying protocol error.
        source: ReconstructError,
    },
}

impl fmt::Display for DefError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateField { model, field } => {
                write!(f, "duplicate field name '{field}' on {model}")
            }
            Self::DuplicateManager { model, manager } => {
                write!(f, "duplicate manager name '{manager}' on {model}")
            }
            Self::FieldNotFound { model, field } => {
                write!(f, "{model} has no field named '{field}'")
            }
            Self::FieldRebuild {
                model,
                field,
                source,
            } => {
                write!(f, "couldn't rebuild field '{field}' on {model}: {source}")
            }
            Self::ManagerRebuild {
                model,
                manager,
                source,
            } => {
                write!(f, "couldn't rebuild manager '{manager}' on {model}: {source}")
            }
        }
    }
}

impl Error for DefError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::FieldRebuild { source, .. } | Self::ManagerRebuild { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offender() {
        let err = DefError::DuplicateField {
            model: ModelKey::new("library", "Book"),
            field: "title".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate field name 'title' on library.book");
    }

    #[test]
    fn rebuild_errors_expose_source() {
        let err = DefError::FieldRebuild {
            model: ModelKey::new("library", "Book"),
            field: "title".to_string(),
            source: ReconstructError::UnknownFieldTag {
                tag: "mystery".to_string(),
            },
        };
        assert!(Error::source(&err).is_some());
        assert!(err.to_string().contains("couldn't rebuild field 'title'"));
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn lookup_errors_have_no_source() {
        let err = DefError::FieldNotFound {
            model: ModelKey::new("library", "Book"),
            field: "isbn".to_string(),
        };
        assert!(Error::source(&err).is_none());
    }
}
