//! Action generators and the dispatcher that selects one.
//!
//! Each generator validates every precondition before building anything and
//! returns either a complete [`PipelineDefinition`] or a [`GenerationError`].

pub mod build_package;
pub mod docker_images;
pub mod full_release;
pub mod jobs;
pub mod nexus_staging;
pub mod pull_requests;

use crate::collaborators::ArtifactVersionReader;
use crate::config::GeneratorConfig;
use crate::error::{GenerationError, Result};
use crate::facts::{ActionKind, EnvironmentFacts};
use crate::obs::{self, GenerationSpan};
use crate::pipeline::PipelineDefinition;

/// Read-only context shared by all generators.
#[derive(Clone, Copy)]
pub struct GeneratorContext<'a> {
    pub config: &'a GeneratorConfig,
    pub versions: &'a dyn ArtifactVersionReader,
}

impl<'a> GeneratorContext<'a> {
    pub fn new(config: &'a GeneratorConfig, versions: &'a dyn ArtifactVersionReader) -> Self {
        Self { config, versions }
    }
}

/// Generate the pipeline for `facts.action`.
pub fn generate(facts: &EnvironmentFacts, ctx: &GeneratorContext<'_>) -> Result<PipelineDefinition> {
    let _span = GenerationSpan::enter(facts);
    obs::emit_generation_started(facts);

    let pipeline = match facts.action {
        ActionKind::PullRequestValidation => Ok(pull_requests::generate(facts, ctx.config)),
        ActionKind::BuildPackage => build_package::generate(facts),
        ActionKind::BuildDockerImages => docker_images::generate(facts),
        ActionKind::FullRelease => full_release::generate(facts, ctx),
        ActionKind::NexusStaging => nexus_staging::generate(facts),
    }?;

    obs::emit_generation_finished(pipeline.workflows().len(), pipeline.jobs().count());
    Ok(pipeline)
}

/// The version, which must not be blank for `action`.
fn require_version(facts: &EnvironmentFacts) -> Result<&str> {
    let version = facts.version.trim();
    if version.is_empty() {
        return Err(GenerationError::MissingVersion {
            action: facts.action,
        });
    }
    Ok(version)
}

fn require_branch(facts: &EnvironmentFacts) -> Result<&str> {
    let branch = facts.branch.trim();
    if branch.is_empty() {
        return Err(GenerationError::MissingBranch {
            action: facts.action,
        });
    }
    Ok(branch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::StaticVersionReader;

    #[test]
    fn test_dispatch_selects_generator_by_action() {
        let config = GeneratorConfig::default();
        let versions = StaticVersionReader::empty();
        let ctx = GeneratorContext::new(&config, &versions);

        let cases = [
            (ActionKind::PullRequestValidation, "pr_lint"),
            (ActionKind::BuildPackage, "build_rpm"),
            (ActionKind::BuildDockerImages, "build_docker_images"),
            (ActionKind::FullRelease, "full_release"),
            (ActionKind::NexusStaging, "nexus_staging"),
        ];
        for (action, first_workflow) in cases {
            let facts = EnvironmentFacts::new(action, "0123456789")
                .with_branch("4.2.x")
                .with_base_branch("4.2.x")
                .with_version("4.2.0");
            let pipeline = generate(&facts, &ctx).unwrap();
            assert_eq!(pipeline.workflow_names()[0], first_workflow, "{action}");
        }
    }

    #[test]
    fn test_require_helpers() {
        let facts = EnvironmentFacts::new(ActionKind::BuildPackage, "abc").with_version("  ");
        assert_eq!(
            require_version(&facts).unwrap_err(),
            GenerationError::MissingVersion {
                action: ActionKind::BuildPackage
            }
        );
        assert_eq!(
            require_branch(&facts).unwrap_err(),
            GenerationError::MissingBranch {
                action: ActionKind::BuildPackage
            }
        );
    }
}
