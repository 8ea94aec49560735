//! APIM CI pipeline generator
//!
//! Turns build environment facts (branch, action, version, changed paths)
//! into a CircleCI 2.1 dynamic configuration document. Generation is pure:
//! the same facts always produce the same document, and a dry run only ever
//! removes publication and tagging work from the real pipeline.

pub mod branch;
pub mod changeset;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod facts;
pub mod fakes;
pub mod generators;
pub mod git;
pub mod obs;
pub mod pipeline;
pub mod serialize;
pub mod telemetry;
pub mod version;

pub use branch::BranchKind;
pub use changeset::PathPredicate;
pub use collaborators::{
    ArtifactVersionReader, DiffProvider, DocumentWriter, FsDocumentWriter, PomVersionReader,
};
pub use config::{GeneratorConfig, Segment, SegmentRule, DEFAULT_TRUNK};
pub use error::{CollaboratorError, ConfigError, FactsError, GenerationError, SerializeError};
pub use facts::{ActionKind, EnvironmentFacts, RawEnvironment, DEFAULT_VERSION_FILE_PATH};
pub use generators::{generate, GeneratorContext};
pub use git::GitDiffProvider;
pub use pipeline::{
    Executor, Job, ParamValue, PipelineBuilder, PipelineDefinition, Step, StepKind, Workflow,
};
pub use serialize::{serialize, DocumentDigest, CONFIG_VERSION};
pub use telemetry::init_tracing;
pub use version::VersionInfo;
