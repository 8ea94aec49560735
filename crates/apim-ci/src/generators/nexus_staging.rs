//! `nexus_staging`: stage the maven reactor on Nexus.
//!
//! Final versions close and release the staging repository; pre-releases
//! leave it open for inspection.

use super::jobs::traced;
use super::require_version;
use crate::error::Result;
use crate::facts::EnvironmentFacts;
use crate::pipeline::{Executor, Job, PipelineBuilder, PipelineDefinition, Step, Workflow};
use crate::version;

pub const WORKFLOW: &str = "nexus_staging";
pub const JOB: &str = "nexus-staging";

pub fn generate(facts: &EnvironmentFacts) -> Result<PipelineDefinition> {
    let version = version::classify(require_version(facts)?)?;

    let mut job = Job::new(JOB, Executor::OpenJdk)
        .step(Step::build(
            "Set release version",
            format!("mvn -B versions:set -DnewVersion={version} -DgenerateBackupPoms=false"),
        ))
        .step(Step::build(
            "Build maven reactor",
            "mvn -s .gravitee.settings.xml -B clean install -DskipTests -P gio-release -T 2C",
        ))
        .step(Step::publish(
            "Deploy to Nexus staging",
            "mvn -s .gravitee.settings.xml -B deploy -DskipTests -P gio-release,gio-publish,nexus-staging",
        ));
    if !version.is_prerelease() {
        job = job.step(Step::publish(
            "Release staging repository",
            "mvn -s .gravitee.settings.xml -B nexus-staging:release -P nexus-staging",
        ));
    }

    Ok(PipelineBuilder::new(facts.is_dry_run)
        .workflow(Workflow::new(WORKFLOW).job(traced(job, facts, &version)))
        .build())
}
