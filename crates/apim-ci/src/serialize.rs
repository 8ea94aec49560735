//! Rendering of a [`PipelineDefinition`] into a CircleCI 2.1 document.
//!
//! Output depends on nothing but the pipeline: top-level keys are emitted as
//! `version`, `executors`, `jobs`, `workflows`; workflows and jobs keep their
//! insertion order and job parameters are sorted by key.

use serde_yaml::{Mapping, Value};
use sha2::{Digest, Sha256};

use crate::error::SerializeError;
use crate::pipeline::{Executor, Job, ParamValue, PipelineDefinition, Step, StepKind};

/// CircleCI configuration schema version.
pub const CONFIG_VERSION: f64 = 2.1;

/// Serialize a pipeline to YAML text.
pub fn serialize(pipeline: &PipelineDefinition) -> Result<String, SerializeError> {
    Ok(serde_yaml::to_string(&to_document(pipeline))?)
}

/// Build the document tree without encoding it.
///
/// When two workflows define a job with the same name, the first definition
/// is the one emitted under `jobs`.
pub fn to_document(pipeline: &PipelineDefinition) -> Value {
    let mut executors = Mapping::new();
    let mut jobs = Mapping::new();
    let mut workflows = Mapping::new();

    for workflow in pipeline.workflows() {
        let mut entries = Vec::with_capacity(workflow.jobs.len());
        for job in &workflow.jobs {
            let executor_key = Value::from(job.executor.name());
            if !executors.contains_key(&executor_key) {
                executors.insert(executor_key, executor_value(job.executor));
            }
            let job_key = Value::from(job.name.as_str());
            if !jobs.contains_key(&job_key) {
                jobs.insert(job_key, job_value(job));
            }
            entries.push(workflow_entry(job));
        }

        let mut body = Mapping::new();
        body.insert("jobs".into(), Value::Sequence(entries));
        workflows.insert(Value::from(workflow.name.as_str()), Value::Mapping(body));
    }

    let mut root = Mapping::new();
    root.insert("version".into(), Value::from(CONFIG_VERSION));
    root.insert("executors".into(), Value::Mapping(executors));
    root.insert("jobs".into(), Value::Mapping(jobs));
    root.insert("workflows".into(), Value::Mapping(workflows));
    Value::Mapping(root)
}

fn executor_value(executor: Executor) -> Value {
    let mut image = Mapping::new();
    image.insert("image".into(), executor.image().into());

    let mut body = Mapping::new();
    if executor.is_machine() {
        body.insert("machine".into(), Value::Mapping(image));
    } else {
        body.insert(
            "docker".into(),
            Value::Sequence(vec![Value::Mapping(image)]),
        );
    }
    Value::Mapping(body)
}

fn job_value(job: &Job) -> Value {
    let mut body = Mapping::new();
    body.insert("executor".into(), job.executor.name().into());

    if !job.params.is_empty() {
        let mut parameters = Mapping::new();
        for (key, value) in &job.params {
            let mut declaration = Mapping::new();
            declaration.insert("type".into(), value.type_name().into());
            declaration.insert("default".into(), param_value(value));
            parameters.insert(key.as_str().into(), Value::Mapping(declaration));
        }
        body.insert("parameters".into(), Value::Mapping(parameters));
    }

    body.insert(
        "steps".into(),
        Value::Sequence(job.steps.iter().map(step_value).collect()),
    );
    Value::Mapping(body)
}

fn step_value(step: &Step) -> Value {
    if step.kind == StepKind::Checkout {
        return "checkout".into();
    }
    let mut run = Mapping::new();
    run.insert("name".into(), step.name.as_str().into());
    run.insert("command".into(), step.command.as_str().into());

    let mut body = Mapping::new();
    body.insert("run".into(), Value::Mapping(run));
    Value::Mapping(body)
}

fn workflow_entry(job: &Job) -> Value {
    if job.requires.is_empty() && job.params.is_empty() {
        return job.name.as_str().into();
    }

    let mut body = Mapping::new();
    if !job.requires.is_empty() {
        body.insert(
            "requires".into(),
            Value::Sequence(job.requires.iter().map(|r| r.as_str().into()).collect()),
        );
    }
    for (key, value) in &job.params {
        body.insert(key.as_str().into(), param_value(value));
    }

    let mut entry = Mapping::new();
    entry.insert(job.name.as_str().into(), Value::Mapping(body));
    Value::Mapping(entry)
}

fn param_value(value: &ParamValue) -> Value {
    match value {
        ParamValue::String(s) => Value::String(s.clone()),
        ParamValue::Bool(b) => Value::Bool(*b),
        ParamValue::Number(n) => Value::Number((*n).into()),
    }
}

/// SHA-256 digest of a serialized document (hex string).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentDigest(String);

impl DocumentDigest {
    pub fn of(document: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(document.as_bytes());
        DocumentDigest(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short form (first 12 hex chars).
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}
