//! `release`: the full release of a support branch.
//!
//! The release version comes from the project descriptor when it supplies
//! one, otherwise from the environment. The two are never merged.
//!
//! Shape depends on version class, `dockerTagAsLatest` and dry-run:
//! - final releases also get floating `MAJOR.MINOR`/`MAJOR` image tags,
//!   published RPMs and a helm chart release
//! - `latest` is applied whenever requested, pre-releases included
//! - dry runs keep builds and drop every publish and tag step

use super::jobs::{self, traced, DOCKER_IMAGES, PACKAGE_BUNDLE};
use super::GeneratorContext;
use crate::branch::{self, BranchKind};
use crate::error::{GenerationError, Result};
use crate::facts::EnvironmentFacts;
use crate::obs;
use crate::pipeline::{Executor, Job, PipelineBuilder, PipelineDefinition, Step, Workflow};
use crate::version::{self, VersionInfo};

pub const WORKFLOW: &str = "full_release";
pub const RELEASE_BACKEND: &str = "release-backend";
pub const RELEASE_HELM: &str = "release-helm";
pub const GITHUB_RELEASE: &str = "github-release";

pub fn generate(facts: &EnvironmentFacts, ctx: &GeneratorContext<'_>) -> Result<PipelineDefinition> {
    if branch::classify(&facts.base_branch, &ctx.config.trunk) != BranchKind::SupportBranch {
        return Err(GenerationError::UnsupportedBranch {
            branch: facts.base_branch.clone(),
        });
    }
    let version = resolve_version(facts, ctx)?;

    let mut workflow = Workflow::new(WORKFLOW)
        .job(traced(release_backend(&version), facts, &version))
        .job(traced(
            jobs::package_bundle(facts, &version)
                .requires(RELEASE_BACKEND)
                .step(upload_bundle(facts, &version)),
            facts,
            &version,
        ))
        .job(traced(
            jobs::docker_images(&version.to_string(), &docker_tags(&version, facts))
                .requires(PACKAGE_BUNDLE),
            facts,
            &version,
        ));

    if !version.is_prerelease() {
        workflow = workflow
            .job(traced(jobs::build_rpm(facts, &version), facts, &version))
            .job(traced(jobs::publish_rpm(facts, &version), facts, &version))
            .job(traced(release_helm(&version), facts, &version));
    }

    let workflow = workflow.job(traced(github_release(&version), facts, &version));

    Ok(PipelineBuilder::new(facts.is_dry_run)
        .workflow(workflow)
        .build())
}

/// Descriptor first, environment second.
fn resolve_version(facts: &EnvironmentFacts, ctx: &GeneratorContext<'_>) -> Result<VersionInfo> {
    let from_descriptor = ctx
        .versions
        .read_version(&facts.artifact_version_file_path)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let (raw, source) = match from_descriptor {
        Some(v) => (v, "descriptor"),
        None if !facts.version.trim().is_empty() => (facts.version.trim().to_string(), "environment"),
        None => {
            return Err(GenerationError::MissingVersion {
                action: facts.action,
            })
        }
    };

    let version = version::classify(&raw)?;
    obs::emit_version_resolved(&raw, source);
    Ok(version)
}

/// Extra image tags beyond the version itself.
fn docker_tags(version: &VersionInfo, facts: &EnvironmentFacts) -> Vec<String> {
    let mut tags = Vec::new();
    if !version.is_prerelease() {
        tags.push(version.major_minor());
        tags.push(version.major.to_string());
    }
    if facts.docker_tag_as_latest {
        tags.push("latest".to_string());
    }
    tags
}

fn release_backend(version: &VersionInfo) -> Job {
    Job::new(RELEASE_BACKEND, Executor::OpenJdk)
        .step(Step::build(
            "Set release version",
            format!("mvn -B versions:set -DnewVersion={version} -DgenerateBackupPoms=false"),
        ))
        .step(Step::build(
            "Build APIM backend",
            "mvn -s .gravitee.settings.xml -B clean install -DskipTests -P gio-release -T 2C",
        ))
        .step(Step::publish(
            "Deploy artifacts to Artifactory",
            "mvn -s .gravitee.settings.xml -B deploy -DskipTests -P gio-release,gio-publish",
        ))
        .step(Step::tag(
            "Tag release commit",
            format!("git tag -a {version} -m \"release({version})\" && git push origin {version}"),
        ))
}

fn upload_bundle(facts: &EnvironmentFacts, version: &VersionInfo) -> Step {
    Step::publish(
        "Upload bundle to download site",
        format!(
            "aws s3 cp {}/{} s3://gravitee-releases-downloads/graviteeio-apim/distributions/",
            jobs::artifact_dir(facts),
            jobs::bundle_file(version)
        ),
    )
}

fn release_helm(version: &VersionInfo) -> Job {
    Job::new(RELEASE_HELM, Executor::Base)
        .requires(DOCKER_IMAGES)
        .step(Step::verify("Lint helm chart", "helm lint helm"))
        .step(Step::package(
            "Package helm chart",
            format!("helm package helm --version {version} --app-version {version}"),
        ))
        .step(Step::publish(
            "Push helm chart",
            format!("helm push apim-{version}.tgz oci://graviteeio.azurecr.io/helm"),
        ))
}

fn github_release(version: &VersionInfo) -> Job {
    let prerelease = if version.is_prerelease() { " --prerelease" } else { "" };
    Job::new(GITHUB_RELEASE, Executor::Base)
        .requires(DOCKER_IMAGES)
        .step(Step::tag(
            "Create GitHub release",
            format!("gh release create {version} --title \"APIM {version}\" --generate-notes{prerelease}"),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::facts::ActionKind;
    use crate::fakes::StaticVersionReader;

    fn facts(version: &str) -> EnvironmentFacts {
        EnvironmentFacts::new(ActionKind::FullRelease, "0123456789")
            .with_branch("4.2.x")
            .with_base_branch("4.2.x")
            .with_version(version)
    }

    fn run(facts: &EnvironmentFacts, descriptor: StaticVersionReader) -> Result<PipelineDefinition> {
        let config = GeneratorConfig::default();
        generate(facts, &GeneratorContext::new(&config, &descriptor))
    }

    #[test]
    fn test_rejects_non_support_base_branch() {
        for base in ["master", "feature/x", "", "4.2.0"] {
            let err = run(&facts("4.2.0").with_base_branch(base), StaticVersionReader::empty())
                .unwrap_err();
            assert_eq!(
                err,
                GenerationError::UnsupportedBranch {
                    branch: base.to_string()
                }
            );
        }
    }

    #[test]
    fn test_branch_checked_before_version() {
        let err = run(&facts("").with_base_branch("master"), StaticVersionReader::empty())
            .unwrap_err();
        assert!(matches!(err, GenerationError::UnsupportedBranch { .. }));
    }

    #[test]
    fn test_missing_version_from_both_sources() {
        let err = run(&facts(""), StaticVersionReader::empty()).unwrap_err();
        assert_eq!(
            err,
            GenerationError::MissingVersion {
                action: ActionKind::FullRelease
            }
        );
    }

    #[test]
    fn test_descriptor_version_wins() {
        let pipeline = run(&facts("4.2.0"), StaticVersionReader::new("4.2.1")).unwrap();
        let job = pipeline.job(RELEASE_BACKEND).unwrap();
        assert_eq!(job.params["apim_version"].to_string(), "4.2.1");
    }

    #[test]
    fn test_blank_descriptor_falls_back_to_environment() {
        let pipeline = run(&facts("4.2.0"), StaticVersionReader::new("  ")).unwrap();
        let job = pipeline.job(RELEASE_BACKEND).unwrap();
        assert_eq!(job.params["apim_version"].to_string(), "4.2.0");
    }

    #[test]
    fn test_invalid_descriptor_version_is_not_merged() {
        let err = run(&facts("4.2.0"), StaticVersionReader::new("4.2.1-SNAPSHOT+x")).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidVersion { .. }));
    }

    #[test]
    fn test_final_release_shape() {
        let pipeline = run(&facts("4.2.0"), StaticVersionReader::empty()).unwrap();
        assert_eq!(
            pipeline.workflow(WORKFLOW).unwrap().job_names(),
            vec![
                RELEASE_BACKEND,
                jobs::PACKAGE_BUNDLE,
                jobs::DOCKER_IMAGES,
                jobs::BUILD_RPM,
                jobs::PUBLISH_RPM,
                RELEASE_HELM,
                GITHUB_RELEASE,
            ]
        );
        assert!(pipeline
            .steps()
            .any(|s| s.command == "docker tag graviteeio/apim-gateway:4.2.0 graviteeio/apim-gateway:4.2"));
        assert!(!pipeline.steps().any(|s| s.command.ends_with(":latest")));
    }

    #[test]
    fn test_prerelease_shape() {
        let pipeline = run(&facts("4.2.0-rc.1"), StaticVersionReader::empty()).unwrap();
        assert_eq!(
            pipeline.workflow(WORKFLOW).unwrap().job_names(),
            vec![RELEASE_BACKEND, jobs::PACKAGE_BUNDLE, jobs::DOCKER_IMAGES, GITHUB_RELEASE]
        );
        let release = pipeline.job(GITHUB_RELEASE).unwrap();
        assert!(release.steps[1].command.ends_with("--prerelease"));
        assert!(!pipeline
            .steps()
            .any(|s| s.command.ends_with("graviteeio/apim-gateway:4.2")));
    }

    #[test]
    fn test_prerelease_may_be_tagged_latest() {
        let pipeline = run(
            &facts("4.2.0-rc.1").with_docker_tag_as_latest(true),
            StaticVersionReader::empty(),
        )
        .unwrap();
        assert!(pipeline
            .steps()
            .any(|s| s.command == "docker tag graviteeio/apim-gateway:4.2.0-rc.1 graviteeio/apim-gateway:latest"));
    }

    #[test]
    fn test_dry_run_drops_publish_and_tag_jobs() {
        let pipeline = run(
            &facts("4.2.0").with_dry_run(true).with_docker_tag_as_latest(true),
            StaticVersionReader::empty(),
        )
        .unwrap();
        assert!(!pipeline.has_side_effects());
        assert!(pipeline.job(jobs::PUBLISH_RPM).is_none());
        assert!(pipeline.job(GITHUB_RELEASE).is_none());
        assert!(pipeline.job(RELEASE_BACKEND).is_some());
        assert!(pipeline.job(RELEASE_HELM).is_some());
    }
}
