//! Error types for rendering and registry operations.

use std::error::Error;
use std::fmt;

use kiln_core::{DefError, ModelKey};

/// One dangling relationship left after a registry build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// The type whose field points nowhere.
    pub consumer: ModelKey,
    /// The pointing field's name.
    pub field: String,
    /// The key the field points at.
    pub target: ModelKey,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} -> {}", self.consumer, self.field, self.target)
    }
}

/// Errors from rendering descriptions into a registry.
///
/// `InvalidBases` is the one recoverable variant: the fixed-point build
/// keeps a description on the worklist when it sees it. Everything else
/// aborts the operation that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderError {
    /// A base is not rendered yet; retry once more types are in.
    InvalidBases {
        /// The type that could not render.
        model: ModelKey,
        /// The bases that were missing.
        missing: Vec<ModelKey>,
    },
    /// A full pass rendered nothing: the remaining types have bases that
    /// are untracked or form a cycle.
    BaseResolution {
        /// Every type still stuck, in worklist order.
        stuck: Vec<ModelKey>,
    },
    /// An ordering option names a field the type does not declare.
    UnknownOrderingField {
        /// The type with the bad option.
        model: ModelKey,
        /// The named field.
        field: String,
    },
    /// Relationships still dangle after every type rendered.
    UnresolvedReferences {
        /// Every dangling edge, so one failure reports them all.
        failures: Vec<UnresolvedReference>,
    },
    /// A lookup missed.
    ModelNotFound {
        /// The requested key.
        key: ModelKey,
    },
    /// A description-level failure during rebuild or import.
    Def(DefError),
}

fn write_keys(f: &mut fmt::Formatter<'_>, keys: &[ModelKey]) -> fmt::Result {
    for (i, key) in keys.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{key}")?;
    }
    Ok(())
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidBases { model, missing } => {
                write!(f, "cannot render {model} yet, bases not available: ")?;
                write_keys(f, missing)
            }
            Self::BaseResolution { stuck } => {
                write!(f, "cannot resolve bases for: ")?;
                write_keys(f, stuck)?;
                write!(
                    f,
                    " (a base may live in an untracked group, or the bases form a cycle)"
                )
            }
            Self::UnknownOrderingField { model, field } => {
                write!(f, "{model} orders by '{field}', which it does not declare")
            }
            Self::UnresolvedReferences { failures } => {
                write!(f, "unresolved references remain: ")?;
                for (i, failure) in failures.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{failure}")?;
                }
                Ok(())
            }
            Self::ModelNotFound { key } => {
                write!(f, "no rendered type registered under {key}")
            }
            Self::Def(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Def(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DefError> for RenderError {
    fn from(err: DefError) -> Self {
        Self::Def(err)
    }
}
