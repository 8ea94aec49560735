//! Collaborator traits at the edges of the generator.
//!
//! - `DiffProvider`: lists files changed between HEAD and a base ref
//! - `DocumentWriter`: persists the serialized pipeline document
//! - `ArtifactVersionReader`: reads the authoritative release version from a
//!   project descriptor
//!
//! Filesystem-backed implementations live here, the git one in
//! [`crate::git`], and in-memory fakes in [`crate::fakes`].

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::CollaboratorError;

/// Source of the change set for transient branches.
pub trait DiffProvider {
    /// Repository-relative paths changed between `base_ref` and HEAD.
    fn changed_files(&self, base_ref: &str) -> Result<Vec<String>, CollaboratorError>;
}

/// Sink for the generated document.
pub trait DocumentWriter {
    fn write(&self, text: &str, destination: &Path) -> Result<(), CollaboratorError>;
}

/// Reads a release version out of a project descriptor.
///
/// `None` means the descriptor could not supply one; callers fall back to the
/// environment-provided version.
pub trait ArtifactVersionReader {
    fn read_version(&self, path: &Path) -> Option<String>;
}

/// Writes documents to the local filesystem, creating parent directories.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDocumentWriter;

impl DocumentWriter for FsDocumentWriter {
    fn write(&self, text: &str, destination: &Path) -> Result<(), CollaboratorError> {
        let io_err = |source| CollaboratorError::Write {
            path: destination.to_path_buf(),
            source,
        };

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(destination, text).map_err(io_err)
    }
}

fn revision_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"<revision>\s*([^<\s]+)\s*</revision>").expect("revision regex is valid")
    })
}

/// Reads the `<revision>` property of a Maven `pom.xml`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PomVersionReader;

impl PomVersionReader {
    /// Extract the revision from descriptor contents.
    pub fn parse(contents: &str) -> Option<String> {
        revision_regex()
            .captures(contents)
            .map(|caps| caps[1].to_string())
    }
}

impl ArtifactVersionReader for PomVersionReader {
    fn read_version(&self, path: &Path) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                let version = Self::parse(&contents);
                if version.is_none() {
                    debug!(path = %path.display(), "No <revision> in version descriptor");
                }
                version
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Version descriptor unreadable");
                None
            }
        }
    }
}
