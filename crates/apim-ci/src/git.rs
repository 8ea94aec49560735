//! Git-backed change-set discovery.

use std::path::PathBuf;
use std::process::Command;

use crate::collaborators::DiffProvider;
use crate::error::CollaboratorError;

/// Lists changed files with `git diff --name-only <remote>/<base>...HEAD`.
#[derive(Debug, Clone)]
pub struct GitDiffProvider {
    repo_dir: PathBuf,
    remote: String,
}

impl GitDiffProvider {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            remote: "origin".to_string(),
        }
    }

    /// Compare against a remote other than `origin`.
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    fn range(&self, base_ref: &str) -> String {
        if self.remote.is_empty() {
            format!("{base_ref}...HEAD")
        } else {
            format!("{}/{base_ref}...HEAD", self.remote)
        }
    }
}

impl DiffProvider for GitDiffProvider {
    fn changed_files(&self, base_ref: &str) -> Result<Vec<String>, CollaboratorError> {
        let range = self.range(base_ref);
        let output = Command::new("git")
            .args(["diff", "--name-only", &range])
            .current_dir(&self.repo_dir)
            .output()
            .map_err(|e| CollaboratorError::Git(format!("failed to run git: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CollaboratorError::Git(format!(
                "git diff {range} failed: {stderr}"
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command as StdCommand;

    fn run_git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        run_git(dir.path(), &["init", "-b", "master"]);
        run_git(dir.path(), &["config", "user.name", "test-user"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["commit", "--allow-empty", "-m", "initial"]);
        dir
    }

    #[test]
    fn changed_files_lists_paths_since_base() {
        let repo = make_git_repo();
        run_git(repo.path(), &["checkout", "-b", "feature/docs"]);
        std::fs::create_dir_all(repo.path().join("docs")).unwrap();
        std::fs::write(repo.path().join("docs/readme.md"), "hello").unwrap();
        run_git(repo.path(), &["add", "."]);
        run_git(repo.path(), &["commit", "-m", "docs"]);

        let provider = GitDiffProvider::new(repo.path()).with_remote("");
        let files = provider.changed_files("master").unwrap();
        assert_eq!(files, vec!["docs/readme.md".to_string()]);
    }

    #[test]
    fn changed_files_fails_for_unknown_ref() {
        let repo = make_git_repo();
        let provider = GitDiffProvider::new(repo.path());
        let err = provider.changed_files("does-not-exist").unwrap_err();
        assert!(matches!(err, CollaboratorError::Git(_)));
    }

    #[test]
    fn changed_files_fails_outside_repo() {
        let dir = tempfile::tempdir().unwrap();
        let provider = GitDiffProvider::new(dir.path()).with_remote("");
        assert!(provider.changed_files("master").is_err());
    }
}
