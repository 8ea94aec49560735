//! `build_docker_images`: build the platform and its container images.
//!
//! Images are tagged with the version when one is supplied, otherwise with a
//! tag derived from the branch and commit. `latest` is added on request.

use super::jobs::{self, BUILD_BACKEND, BUILD_CONSOLE, BUILD_PORTAL};
use super::require_branch;
use crate::error::Result;
use crate::facts::EnvironmentFacts;
use crate::pipeline::{PipelineBuilder, PipelineDefinition, Workflow};
use crate::version;

pub const WORKFLOW: &str = "build_docker_images";

/// Docker tags allow `[A-Za-z0-9_.-]` and at most 128 characters.
const MAX_TAG_LEN: usize = 128;

/// Tag head used when nothing of the branch name survives sanitizing.
const FALLBACK_TAG_HEAD: &str = "branch";

pub fn generate(facts: &EnvironmentFacts) -> Result<PipelineDefinition> {
    let branch = require_branch(facts)?;
    let tag = if facts.version.trim().is_empty() {
        branch_tag(branch, facts.short_sha())
    } else {
        version::classify(&facts.version)?.to_string()
    };

    let extra_tags = if facts.docker_tag_as_latest {
        vec!["latest".to_string()]
    } else {
        Vec::new()
    };

    let images = jobs::docker_images(&tag, &extra_tags)
        .requires(BUILD_BACKEND)
        .requires(BUILD_CONSOLE)
        .requires(BUILD_PORTAL)
        .param("docker_tag", tag.as_str())
        .param("build_id", facts.build_id.as_str());

    let workflow = Workflow::new(WORKFLOW)
        .job(jobs::build_backend())
        .job(jobs::build_console())
        .job(jobs::build_portal())
        .job(images);

    Ok(PipelineBuilder::new(facts.is_dry_run)
        .workflow(workflow)
        .build())
}

/// `feature/APIM-12` at `abc1234` becomes `feature-apim-12-abc1234`.
pub fn branch_tag(branch: &str, short_sha: &str) -> String {
    let sanitized: String = branch
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let sanitized = match sanitized.trim_matches(|c| c == '-' || c == '.') {
        "" => FALLBACK_TAG_HEAD,
        trimmed => trimmed,
    };

    let suffix = format!("-{short_sha}");
    let budget = MAX_TAG_LEN.saturating_sub(suffix.len());
    let head: String = sanitized.chars().take(budget).collect();
    format!("{head}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::facts::ActionKind;
    use crate::pipeline::StepKind;

    fn facts() -> EnvironmentFacts {
        EnvironmentFacts::new(ActionKind::BuildDockerImages, "abc1234def")
            .with_branch("feature/APIM-12 new gateway")
    }

    #[test]
    fn test_missing_branch() {
        let err = generate(&facts().with_branch("")).unwrap_err();
        assert_eq!(
            err,
            GenerationError::MissingBranch {
                action: ActionKind::BuildDockerImages
            }
        );
    }

    #[test]
    fn test_invalid_version() {
        let err = generate(&facts().with_version("latest")).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidVersion { .. }));
    }

    #[test]
    fn test_branch_tag() {
        assert_eq!(
            branch_tag("feature/APIM-12 new gateway", "abc1234"),
            "feature-apim-12-new-gateway-abc1234"
        );
        assert_eq!(branch_tag("///", "abc1234"), "branch-abc1234");
        assert_eq!(branch_tag(".-.", "abc1234"), "branch-abc1234");
        let long = "x".repeat(300);
        assert_eq!(branch_tag(&long, "abc1234").len(), MAX_TAG_LEN);
    }

    #[test]
    fn test_tags_with_branch_when_no_version() {
        let pipeline = generate(&facts()).unwrap();
        let job = pipeline.job(jobs::DOCKER_IMAGES).unwrap();
        assert_eq!(
            job.params["docker_tag"].to_string(),
            "feature-apim-12-new-gateway-abc1234"
        );
        assert_eq!(job.requires, vec![BUILD_BACKEND, BUILD_CONSOLE, BUILD_PORTAL]);
    }

    #[test]
    fn test_tags_with_version_when_supplied() {
        let pipeline = generate(&facts().with_version("4.3.0-alpha.2")).unwrap();
        let job = pipeline.job(jobs::DOCKER_IMAGES).unwrap();
        assert!(job.steps[1]
            .command
            .ends_with("-t graviteeio/apim-gateway:4.3.0-alpha.2 ."));
    }

    #[test]
    fn test_latest_tag_only_on_request() {
        let plain = generate(&facts()).unwrap();
        assert!(!plain.steps().any(|s| s.kind == StepKind::Tag));

        let latest = generate(&facts().with_docker_tag_as_latest(true)).unwrap();
        assert!(latest
            .steps()
            .any(|s| s.kind == StepKind::Tag && s.command.ends_with(":latest")));
    }

    #[test]
    fn test_dry_run_builds_without_pushing() {
        let pipeline = generate(&facts().with_docker_tag_as_latest(true).with_dry_run(true)).unwrap();
        let job = pipeline.job(jobs::DOCKER_IMAGES).unwrap();
        assert!(!job.has_side_effects());
        assert!(job.steps.iter().any(|s| s.kind == StepKind::Build));
    }
}
