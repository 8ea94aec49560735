//! Semantic version classification.
//!
//! Every generator that names artifacts or tags images goes through
//! [`classify`], so final and pre-release versions are told apart by a single
//! rule.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{GenerationError, Result};

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9]+)\.([0-9]+)\.([0-9]+)(?:-([0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*))?$")
            .expect("version regex is valid")
    })
}

/// A parsed `MAJOR.MINOR.PATCH[-QUALIFIER]` version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionInfo {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Pre-release qualifier without the leading hyphen (`alpha.1`).
    pub qualifier: Option<String>,
}

impl VersionInfo {
    /// A version is a pre-release iff it carries a qualifier segment.
    pub fn is_prerelease(&self) -> bool {
        self.qualifier.is_some()
    }

    pub fn core(&self) -> (u64, u64, u64) {
        (self.major, self.minor, self.patch)
    }

    /// `MAJOR.MINOR`, used for floating docker tags and helm channels.
    pub fn major_minor(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(qualifier) = &self.qualifier {
            write!(f, "-{qualifier}")?;
        }
        Ok(())
    }
}

/// Parse and classify a version string.
///
/// Surrounding whitespace is ignored. Build metadata (`+...`) is not part of
/// the accepted grammar.
pub fn classify(version: &str) -> Result<VersionInfo> {
    let invalid = || GenerationError::InvalidVersion {
        value: version.to_string(),
    };

    let caps = version_regex().captures(version.trim()).ok_or_else(invalid)?;
    let number = |idx: usize| -> Result<u64> { caps[idx].parse::<u64>().map_err(|_| invalid()) };

    Ok(VersionInfo {
        major: number(1)?,
        minor: number(2)?,
        patch: number(3)?,
        qualifier: caps.get(4).map(|m| m.as_str().to_string()),
    })
}
