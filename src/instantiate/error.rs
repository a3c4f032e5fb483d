use crate::core::PipelineError;
use thiserror::Error;

/// A factory rejected the arguments it was given
#[derive(Debug, Error)]
pub enum ConstructionError {
    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    #[error("unexpected arguments: {}", .0.join(", "))]
    UnexpectedArguments(Vec<String>),

    #[error("{0} positional arguments left over")]
    TooManyPositional(usize),

    #[error("argument '{name}' expects {expected}, found {found}")]
    InvalidArgument {
        name: String,
        expected: String,
        found: String,
    },

    #[error("argument '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    #[error(transparent)]
    Rejected(#[from] PipelineError),
}

/// Errors raised while turning a declarative node into objects
#[derive(Debug, Error)]
pub enum InstantiateError {
    #[error("cannot resolve target '{target}' at {path}")]
    Resolution { target: String, path: String },

    #[error("failed to construct '{target}' at {path}: {source}")]
    Construction {
        target: String,
        path: String,
        #[source]
        source: ConstructionError,
    },

    #[error("invalid node at {path}: {message}")]
    InvalidSpec { path: String, message: String },

    #[error("expected {expected} at {path}, found {found}")]
    UnexpectedType {
        path: String,
        expected: String,
        found: String,
    },
}

impl InstantiateError {
    /// Construction failures caused by invalid pipeline wiring
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            InstantiateError::Construction {
                source: ConstructionError::Rejected(e),
                ..
            } if e.is_configuration_error()
        )
    }
}
