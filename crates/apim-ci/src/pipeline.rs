//! In-memory pipeline definition: workflows of jobs of steps.
//!
//! Generators assemble workflows and hand them to a [`PipelineBuilder`].
//! The builder applies dry-run pruning once, at the end, so a dry-run
//! pipeline is always the real-run pipeline minus its side effects.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Execution environment of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Executor {
    Base,
    OpenJdk,
    Node,
    Machine,
}

impl Executor {
    pub fn name(&self) -> &'static str {
        match self {
            Executor::Base => "base",
            Executor::OpenJdk => "openjdk",
            Executor::Node => "node",
            Executor::Machine => "ubuntu",
        }
    }

    pub fn image(&self) -> &'static str {
        match self {
            Executor::Base => "cimg/base:stable",
            Executor::OpenJdk => "cimg/openjdk:17.0",
            Executor::Node => "cimg/node:20.11",
            Executor::Machine => "ubuntu-2204:current",
        }
    }

    /// Machine executors run on a VM rather than in a container.
    pub fn is_machine(&self) -> bool {
        matches!(self, Executor::Machine)
    }
}

/// What a step does, as far as dry-run pruning is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Checkout,
    Build,
    Verify,
    /// Produces a named artifact.
    Package,
    /// Pushes an artifact to a persistent store.
    Publish,
    /// Creates a git tag, image tag or release.
    Tag,
}

impl StepKind {
    /// Publish and tag steps are suppressed in dry runs.
    pub fn is_side_effect(&self) -> bool {
        matches!(self, StepKind::Publish | StepKind::Tag)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub kind: StepKind,
    pub name: String,
    pub command: String,
}

impl Step {
    pub fn checkout() -> Self {
        Self {
            kind: StepKind::Checkout,
            name: "checkout".to_string(),
            command: String::new(),
        }
    }

    pub fn new(kind: StepKind, name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            command: command.into(),
        }
    }

    pub fn build(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(StepKind::Build, name, command)
    }

    pub fn verify(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(StepKind::Verify, name, command)
    }

    pub fn package(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(StepKind::Package, name, command)
    }

    pub fn publish(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(StepKind::Publish, name, command)
    }

    pub fn tag(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self::new(StepKind::Tag, name, command)
    }
}

/// Scalar job parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    String(String),
    Bool(bool),
    Number(i64),
}

impl ParamValue {
    /// CircleCI parameter type name.
    pub fn type_name(&self) -> &'static str {
        match self {
            ParamValue::String(_) => "string",
            ParamValue::Bool(_) => "boolean",
            ParamValue::Number(_) => "integer",
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::String(s) => f.write_str(s),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::String(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub executor: Executor,
    pub steps: Vec<Step>,
    /// Names of jobs in the same workflow that must finish first.
    pub requires: Vec<String>,
    pub params: BTreeMap<String, ParamValue>,
}

impl Job {
    pub fn new(name: impl Into<String>, executor: Executor) -> Self {
        Self {
            name: name.into(),
            executor,
            steps: vec![Step::checkout()],
            requires: Vec::new(),
            params: BTreeMap::new(),
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    pub fn requires(mut self, job_name: impl Into<String>) -> Self {
        self.requires.push(job_name.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn has_side_effects(&self) -> bool {
        self.steps.iter().any(|s| s.kind.is_side_effect())
    }

    /// A job with nothing left to do besides checking out the sources.
    fn is_idle(&self) -> bool {
        self.steps.iter().all(|s| s.kind == StepKind::Checkout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    pub name: String,
    pub jobs: Vec<Job>,
}

impl Workflow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jobs: Vec::new(),
        }
    }

    pub fn job(mut self, job: Job) -> Self {
        self.jobs.push(job);
        self
    }

    pub fn job_names(&self) -> Vec<&str> {
        self.jobs.iter().map(|j| j.name.as_str()).collect()
    }

    /// Drop side-effecting steps, then idle jobs, rewiring `requires` so
    /// ordering between the surviving jobs is preserved.
    fn without_side_effects(self) -> Self {
        let mut removed: HashMap<String, Vec<String>> = HashMap::new();
        let mut kept = Vec::new();

        for mut job in self.jobs {
            job.steps.retain(|s| !s.kind.is_side_effect());
            if job.is_idle() {
                removed.insert(job.name.clone(), job.requires.clone());
            } else {
                kept.push(job);
            }
        }

        for job in &mut kept {
            job.requires = resolve_requires(&job.requires, &removed);
        }

        Self {
            name: self.name,
            jobs: kept,
        }
    }
}

fn resolve_requires(requires: &[String], removed: &HashMap<String, Vec<String>>) -> Vec<String> {
    let mut resolved = Vec::new();
    let mut seen = HashSet::new();
    let mut stack: Vec<&String> = requires.iter().rev().collect();

    while let Some(name) = stack.pop() {
        if !seen.insert(name.clone()) {
            continue;
        }
        match removed.get(name) {
            Some(upstream) => stack.extend(upstream.iter().rev()),
            None => resolved.push(name.clone()),
        }
    }
    resolved
}

/// A complete, immutable pipeline.
///
/// `==` compares the model, step kinds included. It is stricter than
/// comparing serialized documents: two pipelines that differ only in a step's
/// kind render the same text but are not equal. Use [`crate::serialize`] and
/// compare the output when document equality is what matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDefinition {
    workflows: Vec<Workflow>,
}

impl PipelineDefinition {
    pub fn workflows(&self) -> &[Workflow] {
        &self.workflows
    }

    pub fn workflow(&self, name: &str) -> Option<&Workflow> {
        self.workflows.iter().find(|w| w.name == name)
    }

    pub fn workflow_names(&self) -> Vec<&str> {
        self.workflows.iter().map(|w| w.name.as_str()).collect()
    }

    /// Every job, in workflow order then job order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.workflows.iter().flat_map(|w| w.jobs.iter())
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs().find(|j| j.name == name)
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.jobs().flat_map(|j| j.steps.iter())
    }

    pub fn has_side_effects(&self) -> bool {
        self.jobs().any(Job::has_side_effects)
    }
}

/// Accumulates workflows and finalizes them into a [`PipelineDefinition`].
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    dry_run: bool,
    workflows: Vec<Workflow>,
}

impl PipelineBuilder {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            workflows: Vec::new(),
        }
    }

    pub fn workflow(mut self, workflow: Workflow) -> Self {
        self.workflows.push(workflow);
        self
    }

    pub fn build(self) -> PipelineDefinition {
        let workflows = if self.dry_run {
            self.workflows
                .into_iter()
                .map(Workflow::without_side_effects)
                .filter(|w| !w.jobs.is_empty())
                .collect()
        } else {
            self.workflows
        };
        PipelineDefinition { workflows }
    }
}
