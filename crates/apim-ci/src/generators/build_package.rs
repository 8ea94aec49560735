//! `build_rpm`: build the distribution bundle, package RPMs, publish them.
//!
//! Shape is keyed by version class and dry-run:
//! - pre-release RPMs go to the unstable repository, finals to the stable one
//! - dry runs keep every build and verification step but never publish

use super::jobs::{self, traced};
use super::{require_branch, require_version};
use crate::error::Result;
use crate::facts::EnvironmentFacts;
use crate::pipeline::{PipelineBuilder, PipelineDefinition, Workflow};
use crate::version;

pub const WORKFLOW: &str = "build_rpm";

pub fn generate(facts: &EnvironmentFacts) -> Result<PipelineDefinition> {
    let raw_version = require_version(facts)?;
    require_branch(facts)?;
    let version = version::classify(raw_version)?;

    let workflow = Workflow::new(WORKFLOW)
        .job(traced(jobs::package_bundle(facts, &version), facts, &version))
        .job(traced(jobs::build_rpm(facts, &version), facts, &version))
        .job(
            traced(jobs::publish_rpm(facts, &version), facts, &version)
                .param("rpm_repository", jobs::rpm_repository(&version)),
        );

    Ok(PipelineBuilder::new(facts.is_dry_run)
        .workflow(workflow)
        .build())
}
