//! Error type for snapshot-level operations.

use std::error::Error;
use std::fmt;

use kiln_core::{DefError, ModelKey};
use kiln_registry::RenderError;

/// Errors from operating on a project schema snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProjectError {
    /// The snapshot holds no description under the key.
    ModelNotFound {
        /// The requested key.
        key: ModelKey,
    },
    /// Building or incrementally updating the registry failed.
    Render(RenderError),
    /// A description-level operation failed outside the registry, such
    /// as cloning a description or importing an external type.
    Def(DefError),
}

impl fmt::Display for ProjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelNotFound { key } => {
                write!(f, "project schema has no description for {key}")
            }
            Self::Render(err) => write!(f, "{err}"),
            Self::Def(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Render(err) => Some(err),
            Self::Def(err) => Some(err),
            Self::ModelNotFound { .. } => None,
        }
    }
}

impl From<RenderError> for ProjectError {
    fn from(err: RenderError) -> Self {
        Self::Render(err)
    }
}

impl From<DefError> for ProjectError {
    fn from(err: DefError) -> Self {
        Self::Def(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_names_the_key() {
        let err = ProjectError::ModelNotFound {
            key: ModelKey::new("library", "Book"),
        };
        assert!(err.to_string().contains("library.book"));
        assert!(Error::source(&err).is_none());
    }

    #[test]
    fn render_errors_chain_as_source() {
        let err = ProjectError::Render(RenderError::ModelNotFound {
            key: ModelKey::new("library", "Book"),
        });
        assert!(Error::source(&err).is_some());
    }
}
