//! Pipeline orchestrator: runs the phases in order and decides continuation.
//!
//! Phases never fail — they return their complete finding lists — and this
//! module is the only place that halts the run. After each of phases 1-5
//! the pipeline stops if any hard finding exists, since later phases assume
//! the invariants checked earlier. Phase 6 always runs to completion once
//! reached. The validator is a stateless oracle: validating the same
//! document twice yields identical results.

use blueprint_model::{parse, to_document, Document};
use blueprint_types::{
    BlueprintError, ErrorCode, Phase, ValidationError, ValidationResult,
};
use serde_json::Value;
use tracing::debug;

use crate::index::NodeIndex;
use crate::{evolution, generation, referential, semantic, structural, verifiability};

/// Options controlling a validation run.
#[derive(Debug, Clone)]
pub struct ValidatorOptions {
    /// Phases to run. The relative 1-6 order is always preserved; listing
    /// a phase twice has no extra effect.
    pub phases: Vec<Phase>,
    /// Treat soft findings as blocking and fold them into `errors`.
    pub strict: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            phases: Phase::ALL.to_vec(),
            strict: false,
        }
    }
}

/// The pipeline orchestrator. Holds only configuration; every run derives
/// its own index and shares nothing with other runs.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidatorOptions,
}

/// Validate source text with default options.
pub fn validate_source(source: &str) -> ValidationResult {
    Validator::new().validate_source(source)
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ValidatorOptions) -> Self {
        Self { options }
    }

    /// Parse source text and run the pipeline. A parse failure is reported
    /// as a single hard phase-1 finding with no location.
    pub fn validate_source(&self, source: &str) -> ValidationResult {
        match parse(source) {
            Ok(raw) => self.validate_value(&raw),
            Err(err) => ValidationResult::failure(parse_failed(err)),
        }
    }

    /// Run the pipeline over a pre-parsed raw value.
    pub fn validate_value(&self, raw: &Value) -> ValidationResult {
        let mut findings: Vec<ValidationError> = Vec::new();
        let mut last = Phase::Structural;

        if self.selected(Phase::Structural) {
            last = Phase::Structural;
            extend_logged(&mut findings, Phase::Structural, structural::check(raw));
            if has_hard(&findings) {
                return self.finish(findings, last);
            }
        }

        if !Phase::ALL.iter().skip(1).any(|p| self.selected(*p)) {
            return self.finish(findings, last);
        }

        let doc = match to_document(raw) {
            Ok(doc) => doc,
            Err(err) => {
                findings.push(parse_failed(err));
                return self.finish(findings, last);
            }
        };

        self.run_graph_phases(&doc, findings, last)
    }

    /// Run phases 2-6 over an already-typed document. Used by callers that
    /// hold a trusted document, e.g. version tooling re-validating after
    /// appending a history entry.
    pub fn validate_document(&self, doc: &Document) -> ValidationResult {
        self.run_graph_phases(doc, Vec::new(), Phase::Structural)
    }

    fn run_graph_phases(
        &self,
        doc: &Document,
        mut findings: Vec<ValidationError>,
        mut last: Phase,
    ) -> ValidationResult {
        let index = NodeIndex::build(&doc.domain.nodes);

        if self.selected(Phase::Referential) {
            last = Phase::Referential;
            extend_logged(
                &mut findings,
                Phase::Referential,
                referential::check(doc, &index),
            );
            if has_hard(&findings) {
                return self.finish(findings, last);
            }
        }

        if self.selected(Phase::Semantic) {
            last = Phase::Semantic;
            extend_logged(&mut findings, Phase::Semantic, semantic::check(doc, &index));
            if has_hard(&findings) {
                return self.finish(findings, last);
            }
        }

        if self.selected(Phase::Evolution) {
            last = Phase::Evolution;
            extend_logged(&mut findings, Phase::Evolution, evolution::check(doc));
            if has_hard(&findings) {
                return self.finish(findings, last);
            }
        }

        if self.selected(Phase::GenerationSafety) {
            last = Phase::GenerationSafety;
            extend_logged(
                &mut findings,
                Phase::GenerationSafety,
                generation::check(doc),
            );
            if has_hard(&findings) {
                return self.finish(findings, last);
            }
        }

        if self.selected(Phase::Verifiability) {
            last = Phase::Verifiability;
            extend_logged(
                &mut findings,
                Phase::Verifiability,
                verifiability::check(doc),
            );
        }

        self.finish(findings, last)
    }

    fn selected(&self, phase: Phase) -> bool {
        self.options.phases.contains(&phase)
    }

    fn finish(&self, findings: Vec<ValidationError>, last: Phase) -> ValidationResult {
        ValidationResult::from_findings(findings, last, self.options.strict)
    }
}

fn has_hard(findings: &[ValidationError]) -> bool {
    findings.iter().any(ValidationError::is_hard)
}

fn extend_logged(findings: &mut Vec<ValidationError>, phase: Phase, batch: Vec<ValidationError>) {
    debug!(phase = %phase, findings = batch.len(), "validation phase complete");
    findings.extend(batch);
}

fn parse_failed(err: BlueprintError) -> ValidationError {
    ValidationError::hard(ErrorCode::ParseFailed, Phase::Structural, err.to_string(), "")
}
