//! In-memory fakes for collaborator traits (testing only)
//!
//! Provides `StaticDiffProvider`, `FailingDiffProvider`,
//! `MemoryDocumentWriter` and `StaticVersionReader`, which satisfy the trait
//! contracts without touching git or the filesystem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::collaborators::{ArtifactVersionReader, DiffProvider, DocumentWriter};
use crate::error::CollaboratorError;

// ---------------------------------------------------------------------------
// Diff providers
// ---------------------------------------------------------------------------

/// Returns a fixed change set and records every base ref it was asked for.
#[derive(Debug, Default)]
pub struct StaticDiffProvider {
    files: Vec<String>,
    requested: Mutex<Vec<String>>,
}

impl StaticDiffProvider {
    pub fn new<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Base refs passed to `changed_files`, in call order.
    pub fn requested_refs(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl DiffProvider for StaticDiffProvider {
    fn changed_files(&self, base_ref: &str) -> Result<Vec<String>, CollaboratorError> {
        self.requested.lock().unwrap().push(base_ref.to_string());
        Ok(self.files.clone())
    }
}

/// Always fails, as a missing remote ref would.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingDiffProvider;

impl DiffProvider for FailingDiffProvider {
    fn changed_files(&self, base_ref: &str) -> Result<Vec<String>, CollaboratorError> {
        Err(CollaboratorError::Git(format!("unknown revision {base_ref}")))
    }
}

// ---------------------------------------------------------------------------
// MemoryDocumentWriter
// ---------------------------------------------------------------------------

/// Keeps written documents in a map keyed by destination.
#[derive(Debug, Default)]
pub struct MemoryDocumentWriter {
    documents: Mutex<BTreeMap<PathBuf, String>>,
}

impl MemoryDocumentWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, destination: &Path) -> Option<String> {
        self.documents.lock().unwrap().get(destination).cloned()
    }

    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DocumentWriter for MemoryDocumentWriter {
    fn write(&self, text: &str, destination: &Path) -> Result<(), CollaboratorError> {
        self.documents
            .lock()
            .unwrap()
            .insert(destination.to_path_buf(), text.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// StaticVersionReader
// ---------------------------------------------------------------------------

/// Returns the same version (or none) for every path.
#[derive(Debug, Default, Clone)]
pub struct StaticVersionReader {
    version: Option<String>,
}

impl StaticVersionReader {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
        }
    }

    /// A reader whose descriptor never supplies a version.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl ArtifactVersionReader for StaticVersionReader {
    fn read_version(&self, _path: &Path) -> Option<String> {
        self.version.clone()
    }
}
