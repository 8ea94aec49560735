//! `pull_requests`: validation of a branch, gated by its change set.
//!
//! The lint workflow always runs. Every configured segment is included when
//! one of its predicates matches a changed path, or unconditionally when the
//! branch is not transient or no change set is available. This generator
//! never fails.

use crate::branch;
use crate::changeset;
use crate::config::{GeneratorConfig, Segment};
use crate::facts::EnvironmentFacts;
use crate::obs;
use crate::pipeline::{Executor, Job, PipelineBuilder, PipelineDefinition, Step, Workflow};

use super::jobs::{self, BUILD_BACKEND};

pub const LINT_WORKFLOW: &str = "pr_lint";

pub fn generate(facts: &EnvironmentFacts, config: &GeneratorConfig) -> PipelineDefinition {
    let kind = branch::classify(&facts.branch, &config.trunk);
    let gated = kind.uses_change_set() && !facts.changed_files.is_empty();

    let mut builder = PipelineBuilder::new(facts.is_dry_run).workflow(lint_workflow(facts, config));

    for rule in &config.segments {
        let name = rule.segment.name();
        if !gated {
            obs::emit_segment_included(name, "full run");
        } else if changeset::matches_any(&facts.changed_files, &rule.predicates) {
            obs::emit_segment_included(name, "changed files");
        } else {
            obs::emit_segment_skipped(name);
            continue;
        }
        builder = builder.workflow(segment_workflow(rule.segment));
    }

    builder.build()
}

/// Workflow name of a segment.
pub fn workflow_name(segment: Segment) -> String {
    format!("pr_{}", segment.name())
}

fn lint_workflow(facts: &EnvironmentFacts, config: &GeneratorConfig) -> Workflow {
    let base = if facts.base_branch.is_empty() {
        config.trunk.as_str()
    } else {
        facts.base_branch.as_str()
    };

    Workflow::new(LINT_WORKFLOW)
        .job(Job::new("lint-commits", Executor::Node).step(Step::verify(
            "Validate commit messages",
            format!("npx commitlint --from origin/{base} --to HEAD"),
        )))
        .job(Job::new("license-check", Executor::OpenJdk).step(Step::verify(
            "Check license headers",
            "mvn -B license:check",
        )))
}

fn segment_workflow(segment: Segment) -> Workflow {
    let workflow = Workflow::new(workflow_name(segment));
    match segment {
        Segment::Backend => workflow.job(jobs::build_backend()).job(
            Job::new("test-backend", Executor::OpenJdk)
                .requires(BUILD_BACKEND)
                .step(Step::verify("Run backend tests", "mvn -s .gravitee.settings.xml -B test -T 2C")),
        ),
        Segment::Console => workflow
            .job(
                Job::new("lint-test-console", Executor::Node)
                    .step(Step::verify("Lint console", "yarn --cwd gravitee-apim-console-webui lint"))
                    .step(Step::verify("Test console", "yarn --cwd gravitee-apim-console-webui test")),
            )
            .job(jobs::build_console()),
        Segment::Portal => workflow
            .job(
                Job::new("lint-test-portal", Executor::Node)
                    .step(Step::verify("Lint portal", "yarn --cwd gravitee-apim-portal-webui-next lint"))
                    .step(Step::verify("Test portal", "yarn --cwd gravitee-apim-portal-webui-next test")),
            )
            .job(jobs::build_portal()),
        Segment::Helm => workflow.job(
            Job::new("helm-tests", Executor::Base)
                .step(Step::verify("Lint helm chart", "helm lint helm"))
                .step(Step::verify("Run helm unit tests", "helm unittest helm")),
        ),
        Segment::E2e => workflow.job(
            Job::new("e2e-tests", Executor::Machine)
                .step(Step::build(
                    "Start APIM stack",
                    "docker compose -f gravitee-apim-e2e/docker/docker-compose.yml up -d --wait",
                ))
                .step(Step::verify("Run API tests", "yarn --cwd gravitee-apim-e2e test:api")),
        ),
    }
}
