//! Environment facts: the immutable input record of one generator run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::branch::{self, BranchKind};
use crate::collaborators::DiffProvider;
use crate::error::{FactsError, GenerationError};

/// Default location of the Maven descriptor carrying the release version.
pub const DEFAULT_VERSION_FILE_PATH: &str = "/home/circleci/project/pom.xml";

/// The closed set of actions a pipeline can be generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// `pull_requests`
    PullRequestValidation,
    /// `build_rpm`
    BuildPackage,
    /// `build_docker_images`
    BuildDockerImages,
    /// `release`
    FullRelease,
    /// `nexus_staging`
    NexusStaging,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::PullRequestValidation,
        ActionKind::BuildPackage,
        ActionKind::BuildDockerImages,
        ActionKind::FullRelease,
        ActionKind::NexusStaging,
    ];

    /// The action keyword as supplied by the environment.
    pub fn keyword(&self) -> &'static str {
        match self {
            ActionKind::PullRequestValidation => "pull_requests",
            ActionKind::BuildPackage => "build_rpm",
            ActionKind::BuildDockerImages => "build_docker_images",
            ActionKind::FullRelease => "release",
            ActionKind::NexusStaging => "nexus_staging",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for ActionKind {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionKind::ALL
            .into_iter()
            .find(|action| action.keyword() == s)
            .ok_or_else(|| GenerationError::UnknownAction {
                value: s.to_string(),
            })
    }
}

/// Raw, unvalidated inputs as read from flags or environment variables.
#[derive(Debug, Clone, Default)]
pub struct RawEnvironment {
    pub branch: Option<String>,
    pub base_branch: Option<String>,
    pub commit_sha: Option<String>,
    pub build_id: Option<String>,
    pub action: Option<String>,
    pub dry_run: Option<String>,
    pub docker_tag_as_latest: Option<String>,
    pub version: Option<String>,
    pub version_file_path: Option<String>,
}

/// A raw flag is set only when it is exactly `true`.
pub fn parse_flag(raw: Option<&str>) -> bool {
    raw == Some("true")
}

/// Everything a generator needs to know about the build it runs for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentFacts {
    pub branch: String,
    pub base_branch: String,
    pub commit_sha: String,
    pub action: ActionKind,
    pub is_dry_run: bool,
    pub version: String,
    /// Paths changed relative to `base_branch`; always empty for trunk and
    /// support branches.
    pub changed_files: Vec<String>,
    pub docker_tag_as_latest: bool,
    pub build_id: String,
    pub artifact_version_file_path: PathBuf,
}

impl EnvironmentFacts {
    /// Facts with every optional field at its default.
    pub fn new(action: ActionKind, commit_sha: impl Into<String>) -> Self {
        Self {
            branch: String::new(),
            base_branch: String::new(),
            commit_sha: commit_sha.into(),
            action,
            is_dry_run: false,
            version: String::new(),
            changed_files: Vec::new(),
            docker_tag_as_latest: false,
            build_id: String::new(),
            artifact_version_file_path: PathBuf::from(DEFAULT_VERSION_FILE_PATH),
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    pub fn with_base_branch(mut self, base_branch: impl Into<String>) -> Self {
        self.base_branch = base_branch.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_dry_run(mut self, is_dry_run: bool) -> Self {
        self.is_dry_run = is_dry_run;
        self
    }

    pub fn with_docker_tag_as_latest(mut self, latest: bool) -> Self {
        self.docker_tag_as_latest = latest;
        self
    }

    pub fn with_build_id(mut self, build_id: impl Into<String>) -> Self {
        self.build_id = build_id.into();
        self
    }

    pub fn with_changed_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changed_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_artifact_version_file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_version_file_path = path.into();
        self
    }

    /// Build facts from raw inputs.
    ///
    /// The diff provider is consulted only for non-blank transient branches;
    /// its failure is logged and yields an empty change set.
    pub fn assemble(
        raw: RawEnvironment,
        trunk_name: &str,
        diff: &dyn DiffProvider,
    ) -> Result<Self, FactsError> {
        let commit_sha = non_blank(raw.commit_sha).ok_or(FactsError::MissingCommitSha)?;
        let action: ActionKind = non_blank(raw.action)
            .ok_or(FactsError::MissingAction)?
            .parse()?;

        let branch = raw.branch.unwrap_or_default().trim().to_string();
        let base_branch = raw.base_branch.unwrap_or_default().trim().to_string();

        let changed_files = if !branch.is_empty()
            && branch::classify(&branch, trunk_name) == BranchKind::Transient
        {
            let base_ref = if base_branch.is_empty() {
                trunk_name
            } else {
                base_branch.as_str()
            };
            match diff.changed_files(base_ref) {
                Ok(files) => {
                    debug!(base_ref = %base_ref, count = files.len(), "Computed change set");
                    files
                }
                Err(e) => {
                    warn!(base_ref = %base_ref, error = %e, "Diff unavailable, running every segment");
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            branch,
            base_branch,
            commit_sha,
            action,
            is_dry_run: parse_flag(raw.dry_run.as_deref()),
            version: raw.version.unwrap_or_default().trim().to_string(),
            changed_files,
            docker_tag_as_latest: parse_flag(raw.docker_tag_as_latest.as_deref()),
            build_id: raw.build_id.unwrap_or_default(),
            artifact_version_file_path: non_blank(raw.version_file_path)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VERSION_FILE_PATH)),
        })
    }

    /// Short commit identifier used in image tags.
    pub fn short_sha(&self) -> &str {
        let end = self
            .commit_sha
            .char_indices()
            .nth(7)
            .map_or(self.commit_sha.len(), |(idx, _)| idx);
        &self.commit_sha[..end]
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
