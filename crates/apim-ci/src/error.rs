//! Error taxonomy for pipeline generation.

use std::path::PathBuf;

use crate::facts::ActionKind;

/// Validation failures raised by action generators.
///
/// Every generator checks all of its preconditions before building anything,
/// so one of these means no pipeline was produced at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("action {action} requires a version")]
    MissingVersion { action: ActionKind },

    #[error("action {action} requires a branch")]
    MissingBranch { action: ActionKind },

    #[error("full release only supported on support branches, got '{branch}'")]
    UnsupportedBranch { branch: String },

    #[error("invalid version '{value}': expected MAJOR.MINOR.PATCH[-QUALIFIER]")]
    InvalidVersion { value: String },

    #[error("unknown action '{value}'")]
    UnknownAction { value: String },
}

/// Failures while assembling [`crate::EnvironmentFacts`] from raw inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FactsError {
    #[error("commit SHA is required")]
    MissingCommitSha,

    #[error("action is required")]
    MissingAction,

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Failures reported by external collaborators (diff provider, writer).
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("git error: {0}")]
    Git(String),

    #[error("failed to write document to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures while loading a [`crate::GeneratorConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid path predicate '{pattern}': {source}")]
    InvalidPredicate {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("unknown workflow segment '{name}'")]
    UnknownSegment { name: String },

    #[error("trunk branch name must not be empty")]
    EmptyTrunk,
}

/// Failure while rendering a pipeline to its document form.
#[derive(Debug, thiserror::Error)]
#[error("failed to encode pipeline document: {0}")]
pub struct SerializeError(#[from] pub serde_yaml::Error);

/// Result type for generator operations.
pub type Result<T> = std::result::Result<T, GenerationError>;
