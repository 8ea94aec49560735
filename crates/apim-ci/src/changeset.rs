//! Change-set predicates used to gate workflow segments.
//!
//! A predicate is either a plain path prefix (`gravitee-apim-gateway/`) or a
//! glob (`**/*.md`). An empty change set satisfies every predicate: when no
//! diff was computed, everything runs.

use std::fmt;

use glob::{MatchOptions, Pattern};

use crate::error::ConfigError;

const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A single path predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPredicate {
    Prefix(String),
    Glob(Pattern),
}

impl PathPredicate {
    /// Parse a predicate; anything containing glob metacharacters is a glob.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if raw.contains(['*', '?', '[']) {
            let pattern = Pattern::new(raw).map_err(|source| ConfigError::InvalidPredicate {
                pattern: raw.to_string(),
                source,
            })?;
            Ok(PathPredicate::Glob(pattern))
        } else {
            Ok(PathPredicate::Prefix(raw.to_string()))
        }
    }

    pub fn prefix(prefix: impl Into<String>) -> Self {
        PathPredicate::Prefix(prefix.into())
    }

    /// Whether a single repository-relative path satisfies this predicate.
    pub fn is_satisfied_by(&self, path: &str) -> bool {
        match self {
            PathPredicate::Prefix(prefix) => path.starts_with(prefix.as_str()),
            PathPredicate::Glob(pattern) => pattern.matches_with(path, GLOB_OPTIONS),
        }
    }
}

impl fmt::Display for PathPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathPredicate::Prefix(prefix) => f.write_str(prefix),
            PathPredicate::Glob(pattern) => f.write_str(pattern.as_str()),
        }
    }
}

/// True iff at least one changed path satisfies `predicate`, or the change
/// set is empty.
pub fn matches(changed_files: &[String], predicate: &PathPredicate) -> bool {
    changed_files.is_empty() || changed_files.iter().any(|p| predicate.is_satisfied_by(p))
}

/// True iff any predicate in `predicates` matches (see [`matches`]).
pub fn matches_any(changed_files: &[String], predicates: &[PathPredicate]) -> bool {
    changed_files.is_empty() || predicates.iter().any(|p| matches(changed_files, p))
}
