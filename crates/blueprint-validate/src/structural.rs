//! Phase 1 — structural validation of the raw parsed document.
//!
//! Runs against the untyped value so that shape violations are reported as
//! findings instead of lowering failures. Collects every violation in one
//! pass; the orchestrator halts the pipeline afterwards when any hard
//! finding exists, since later phases require a trustworthy shape.

use std::collections::HashSet;
use std::sync::OnceLock;

use blueprint_model::{NodeKind, SPEC_TAG};
use blueprint_types::{ErrorCode, Phase, ValidationError};
use regex::Regex;
use serde_json::Value;

const PHASE: Phase = Phase::Structural;

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_.-]*$").unwrap())
}

fn hard(code: ErrorCode, message: String, location: String) -> ValidationError {
    ValidationError::hard(code, PHASE, message, location)
}

/// Run the structural phase over the raw parsed value.
pub fn check(raw: &Value) -> Vec<ValidationError> {
    let mut findings = Vec::new();

    let Some(root) = raw.as_object() else {
        findings.push(hard(
            ErrorCode::ParseFailed,
            "document root is not a mapping".into(),
            String::new(),
        ));
        return findings;
    };

    check_spec_tag(root.get("spec"), &mut findings);
    check_project(root.get("project"), &mut findings);
    check_structure(root.get("structure"), &mut findings);
    check_nodes(root.get("domain"), &mut findings);

    findings
}

fn check_spec_tag(value: Option<&Value>, findings: &mut Vec<ValidationError>) {
    match value.and_then(Value::as_str) {
        None => findings.push(
            hard(
                ErrorCode::InvalidSpecTag,
                "document is missing the `spec` tag".into(),
                "spec".into(),
            )
            .with_suggestion(format!("add `spec: {SPEC_TAG}` at the top level")),
        ),
        Some(tag) if tag != SPEC_TAG => findings.push(
            hard(
                ErrorCode::InvalidSpecTag,
                format!("unsupported spec tag '{tag}'"),
                "spec".into(),
            )
            .with_suggestion(format!("this validator accepts `{SPEC_TAG}`")),
        ),
        Some(_) => {}
    }
}

fn check_project(value: Option<&Value>, findings: &mut Vec<ValidationError>) {
    let Some(project) = value.and_then(Value::as_object) else {
        findings.push(hard(
            ErrorCode::MissingProjectId,
            "project.id is missing".into(),
            "project".into(),
        ));
        findings.push(hard(
            ErrorCode::MissingVersioning,
            "project.versioning is missing".into(),
            "project".into(),
        ));
        return;
    };

    let id_ok = project
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| !id.trim().is_empty());
    if !id_ok {
        findings.push(hard(
            ErrorCode::MissingProjectId,
            "project.id must be a non-empty string".into(),
            "project.id".into(),
        ));
    }

    let Some(versioning) = project.get("versioning").and_then(Value::as_object) else {
        findings.push(hard(
            ErrorCode::MissingVersioning,
            "project.versioning is missing".into(),
            "project.versioning".into(),
        ));
        return;
    };
    for key in ["strategy", "current"] {
        let present = versioning
            .get(key)
            .and_then(Value::as_str)
            .is_some_and(|v| !v.trim().is_empty());
        if !present {
            findings.push(hard(
                ErrorCode::MissingVersioning,
                format!("project.versioning.{key} must be a non-empty string"),
                format!("project.versioning.{key}"),
            ));
        }
    }
}

fn check_structure(value: Option<&Value>, findings: &mut Vec<ValidationError>) {
    let root_ok = value
        .and_then(|s| s.get("root"))
        .and_then(Value::as_str)
        .is_some_and(|r| !r.trim().is_empty());
    if !root_ok {
        findings.push(hard(
            ErrorCode::MissingStructureRoot,
            "structure.root must be a reference to the root node".into(),
            "structure.root".into(),
        ));
    }
}

fn check_nodes(domain: Option<&Value>, findings: &mut Vec<ValidationError>) {
    let Some(nodes) = domain.and_then(|d| d.get("nodes")).and_then(Value::as_array) else {
        findings.push(hard(
            ErrorCode::MissingDomainNodes,
            "domain.nodes must be a sequence of nodes".into(),
            "domain.nodes".into(),
        ));
        return;
    };

    let mut seen_ids: HashSet<&str> = HashSet::new();
    for (pos, entry) in nodes.iter().enumerate() {
        let base = format!("domain.nodes[{pos}]");

        let Some(node) = entry.as_object() else {
            findings.push(hard(
                ErrorCode::MalformedNode,
                "node entry is not a mapping".into(),
                base,
            ));
            continue;
        };

        match node.get("kind").and_then(Value::as_str) {
            None => findings.push(hard(
                ErrorCode::InvalidNodeKind,
                "node kind is missing".into(),
                format!("{base}.kind"),
            )),
            Some(kind) if NodeKind::from_tag(kind).is_none() => findings.push(
                hard(
                    ErrorCode::InvalidNodeKind,
                    format!("unknown node kind '{kind}'"),
                    format!("{base}.kind"),
                )
                .with_suggestion("use one of the 14 node kinds, e.g. Entity, Command, Event"),
            ),
            Some(_) => {}
        }

        match node.get("id").and_then(Value::as_str) {
            None => findings.push(hard(
                ErrorCode::InvalidNodeId,
                "node id is missing".into(),
                format!("{base}.id"),
            )),
            Some(id) => {
                if !id_pattern().is_match(id) {
                    findings.push(hard(
                        ErrorCode::InvalidNodeId,
                        format!("node id '{id}' does not match ^[a-z][a-z0-9_.-]*$"),
                        format!("{base}.id"),
                    ));
                }
                // First occurrence wins; every later duplicate is reported
                // at its own location.
                if !seen_ids.insert(id) {
                    findings.push(hard(
                        ErrorCode::DuplicateNodeId,
                        format!("duplicate node id '{id}'"),
                        format!("{base}.id"),
                    ));
                }
            }
        }

        match node.get("spec") {
            Some(Value::Object(_)) => {}
            Some(_) => findings.push(hard(
                ErrorCode::InvalidNodeSpec,
                "node spec must be a mapping".into(),
                format!("{base}.spec"),
            )),
            None => findings.push(hard(
                ErrorCode::InvalidNodeSpec,
                "node spec is missing".into(),
                format!("{base}.spec"),
            )),
        }

        match node.get("children") {
            None => {}
            Some(Value::Array(children)) => {
                for (child_pos, child) in children.iter().enumerate() {
                    if !child.is_string() {
                        findings.push(hard(
                            ErrorCode::InvalidChildren,
                            "children entries must be reference strings".into(),
                            format!("{base}.children[{child_pos}]"),
                        ));
                    }
                }
            }
            Some(_) => findings.push(hard(
                ErrorCode::InvalidChildren,
                "children must be a sequence of references".into(),
                format!("{base}.children"),
            )),
        }
    }
}
