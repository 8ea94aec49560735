//! Structured observability hooks for the generation lifecycle.
//!
//! Events are emitted at `info!` level (filter with `RUST_LOG`). None of
//! them feed back into the generated document.

use tracing::info;

use crate::facts::EnvironmentFacts;

/// RAII guard that enters a generation-scoped span.
pub struct GenerationSpan {
    _span: tracing::span::EnteredSpan,
}

impl GenerationSpan {
    pub fn enter(facts: &EnvironmentFacts) -> Self {
        let span = tracing::info_span!(
            "apim_ci.generate",
            action = %facts.action,
            build_id = %facts.build_id,
        );
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: generation started for the given facts.
pub fn emit_generation_started(facts: &EnvironmentFacts) {
    info!(
        event = "generation.started",
        action = %facts.action,
        branch = %facts.branch,
        base_branch = %facts.base_branch,
        dry_run = facts.is_dry_run,
        changed_files = facts.changed_files.len(),
    );
}

/// Emit event: a pull-request segment was included.
pub fn emit_segment_included(segment: &str, reason: &str) {
    info!(event = "segment.included", segment = %segment, reason = %reason);
}

/// Emit event: a pull-request segment was skipped.
pub fn emit_segment_skipped(segment: &str) {
    info!(event = "segment.skipped", segment = %segment);
}

/// Emit event: the release version was resolved from one of its sources.
pub fn emit_version_resolved(version: &str, source: &str) {
    info!(event = "version.resolved", version = %version, source = %source);
}

/// Emit event: generation finished with the given pipeline size.
pub fn emit_generation_finished(workflows: usize, jobs: usize) {
    info!(event = "generation.finished", workflows = workflows, jobs = jobs);
}

/// Emit event: document written, with its digest.
pub fn emit_document_written(destination: &str, digest: &str, bytes: usize) {
    info!(
        event = "document.written",
        destination = %destination,
        digest = %digest,
        bytes = bytes,
    );
}
