//! Phase 3 — kind-specific semantic contracts and type references.
//!
//! Every node is dispatched on its kind through an exhaustive match, so a
//! new kind without a checker is a compile error rather than a silent gap.
//! Type references of the form `ref(<entity>)` are resolved against the
//! index; `enum(<name>)` types are checked for syntactic shape only.

use blueprint_model::{ref_target, Document, Node, NodeKind};
use blueprint_types::{ErrorCode, Phase, ValidationError};
use serde_json::Value;

use crate::index::NodeIndex;

const PHASE: Phase = Phase::Semantic;

fn hard(code: ErrorCode, message: String, location: String) -> ValidationError {
    ValidationError::hard(code, PHASE, message, location)
}

/// Run the semantic phase.
pub fn check(doc: &Document, index: &NodeIndex) -> Vec<ValidationError> {
    let mut findings = Vec::new();

    for (pos, node) in doc.domain.nodes.iter().enumerate() {
        let base = format!("domain.nodes[{pos}]");
        match node.kind {
            NodeKind::System => check_system(node, &base, &mut findings),
            NodeKind::Entity | NodeKind::Value => check_fields(node, index, &base, &mut findings),
            NodeKind::Enum => check_enum(node, &base, &mut findings),
            NodeKind::Command => check_command(node, index, &base, &mut findings),
            NodeKind::Event => check_event(node, &base, &mut findings),
            NodeKind::Query => check_query(node, &base, &mut findings),
            NodeKind::Process => check_process(node, index, &base, &mut findings),
            NodeKind::Step => check_step(node, &base, &mut findings),
            NodeKind::Scenario => check_scenario(node, &base, &mut findings),
            // No kind-specific contract beyond the shared checks below.
            NodeKind::Module | NodeKind::Interface | NodeKind::Policy | NodeKind::Contract => {}
        }
        check_node_contracts(node, &base, &mut findings);
    }

    check_hook_contracts(doc, &mut findings);

    findings
}

fn check_system(node: &Node, base: &str, findings: &mut Vec<ValidationError>) {
    match node.spec.get("goals") {
        Some(Value::Array(_)) => {}
        Some(_) => findings.push(hard(
            ErrorCode::MissingGoals,
            format!("system '{}' goals must be a sequence", node.id),
            format!("{base}.spec.goals"),
        )),
        None => findings.push(hard(
            ErrorCode::MissingGoals,
            format!("system '{}' must declare goals", node.id),
            format!("{base}.spec.goals"),
        )),
    }
}

/// Shared by Entity and Value nodes: `fields` must be present (an empty
/// mapping is permitted), and every field must declare a type. `ref(...)`
/// types must name an existing Entity.
fn check_fields(node: &Node, index: &NodeIndex, base: &str, findings: &mut Vec<ValidationError>) {
    let fields = match node.spec.get("fields") {
        Some(Value::Object(fields)) => fields,
        Some(_) => {
            findings.push(hard(
                ErrorCode::MissingFields,
                format!("'{}' fields must be a mapping", node.id),
                format!("{base}.spec.fields"),
            ));
            return;
        }
        None => {
            findings.push(hard(
                ErrorCode::MissingFields,
                format!("'{}' must declare fields", node.id),
                format!("{base}.spec.fields"),
            ));
            return;
        }
    };

    for (name, decl) in fields {
        let field_loc = format!("{base}.spec.fields.{name}");
        let Some(decl) = decl.as_object() else {
            findings.push(hard(
                ErrorCode::MissingFieldType,
                format!("field '{name}' of '{}' must be a mapping declaring a type", node.id),
                field_loc,
            ));
            continue;
        };
        let Some(field_type) = decl.get("type").and_then(Value::as_str) else {
            findings.push(hard(
                ErrorCode::MissingFieldType,
                format!("field '{name}' of '{}' does not declare a type", node.id),
                field_loc,
            ));
            continue;
        };
        check_field_type(field_type, &node.id, name, &field_loc, index, findings);
    }
}

fn check_field_type(
    field_type: &str,
    node_id: &str,
    field_name: &str,
    field_loc: &str,
    index: &NodeIndex,
    findings: &mut Vec<ValidationError>,
) {
    if let Some(target) = unwrap_call(field_type, "ref") {
        if !index.is_entity(target) {
            findings.push(
                hard(
                    ErrorCode::UnresolvedRefType,
                    format!(
                        "field '{field_name}' of '{node_id}' has type '{field_type}' but no Entity '{target}' exists"
                    ),
                    format!("{field_loc}.type"),
                )
                .with_suggestion(format!("declare an Entity node with id '{target}'")),
            );
        }
    } else if let Some(name) = unwrap_call(field_type, "enum") {
        // Syntactic shape only; name-to-id mapping is out of scope here.
        if name.is_empty() {
            findings.push(hard(
                ErrorCode::InvalidEnumType,
                format!("field '{field_name}' of '{node_id}' has an enum type with no name"),
                format!("{field_loc}.type"),
            ));
        }
    }
}

/// Extract the argument of a `name(<arg>)` type expression.
fn unwrap_call<'a>(expr: &'a str, name: &str) -> Option<&'a str> {
    expr.strip_prefix(name)?
        .strip_prefix('(')?
        .strip_suffix(')')
        .map(str::trim)
}

fn check_enum(node: &Node, base: &str, findings: &mut Vec<ValidationError>) {
    match node.spec.get("values") {
        Some(Value::Array(_)) => {}
        Some(_) => findings.push(hard(
            ErrorCode::MissingValues,
            format!("enum '{}' values must be a sequence", node.id),
            format!("{base}.spec.values"),
        )),
        None => findings.push(hard(
            ErrorCode::MissingValues,
            format!("enum '{}' must declare values", node.id),
            format!("{base}.spec.values"),
        )),
    }
}

fn check_command(node: &Node, index: &NodeIndex, base: &str, findings: &mut Vec<ValidationError>) {
    if node.spec.get("input").is_none() {
        findings.push(hard(
            ErrorCode::MissingInput,
            format!("command '{}' must declare input", node.id),
            format!("{base}.spec.input"),
        ));
    }

    let Some(effects) = node.spec.get("effects").and_then(Value::as_object) else {
        return;
    };
    if let Some(Value::Array(emits)) = effects.get("emits") {
        for (pos, entry) in emits.iter().enumerate() {
            let loc = format!("{base}.spec.effects.emits[{pos}]");
            let Some(raw) = entry.as_str() else {
                findings.push(hard(
                    ErrorCode::UnresolvedEffectEvent,
                    format!("emitted effect of '{}' must be an event id string", node.id),
                    loc,
                ));
                continue;
            };
            let target = ref_target(raw);
            if !index.is_event(target) {
                findings.push(hard(
                    ErrorCode::UnresolvedEffectEvent,
                    format!("command '{}' emits '{target}' but no Event with that id exists", node.id),
                    loc,
                ));
            }
        }
    }
    if let Some(Value::Array(modifies)) = effects.get("modifies") {
        for (pos, entry) in modifies.iter().enumerate() {
            let loc = format!("{base}.spec.effects.modifies[{pos}]");
            let Some(raw) = entry.as_str() else {
                findings.push(hard(
                    ErrorCode::UnresolvedEffectEntity,
                    format!("modified effect of '{}' must be an entity id string", node.id),
                    loc,
                ));
                continue;
            };
            let target = ref_target(raw);
            if !index.is_entity(target) {
                findings.push(hard(
                    ErrorCode::UnresolvedEffectEntity,
                    format!(
                        "command '{}' modifies '{target}' but no Entity with that id exists",
                        node.id
                    ),
                    loc,
                ));
            }
        }
    }
}

fn check_event(node: &Node, base: &str, findings: &mut Vec<ValidationError>) {
    if node.spec.get("payload").is_none() {
        findings.push(hard(
            ErrorCode::MissingPayload,
            format!("event '{}' must declare payload", node.id),
            format!("{base}.spec.payload"),
        ));
    }
}

fn check_query(node: &Node, base: &str, findings: &mut Vec<ValidationError>) {
    if node.spec.get("input").is_none() {
        findings.push(hard(
            ErrorCode::MissingInput,
            format!("query '{}' must declare input", node.id),
            format!("{base}.spec.input"),
        ));
    }
    if node.spec.get("output").is_none() {
        findings.push(hard(
            ErrorCode::MissingOutput,
            format!("query '{}' must declare output", node.id),
            format!("{base}.spec.output"),
        ));
    }
}

fn check_process(node: &Node, index: &NodeIndex, base: &str, findings: &mut Vec<ValidationError>) {
    match node.spec.get("trigger").and_then(Value::as_str) {
        None => findings.push(hard(
            ErrorCode::MissingTrigger,
            format!("process '{}' must declare a trigger", node.id),
            format!("{base}.spec.trigger"),
        )),
        Some(raw) => {
            let target = ref_target(raw);
            match index.node(target) {
                None => findings.push(hard(
                    ErrorCode::UnresolvedTrigger,
                    format!("process '{}' trigger '{target}' does not resolve", node.id),
                    format!("{base}.spec.trigger"),
                )),
                Some(trigger)
                    if !matches!(trigger.kind, NodeKind::Command | NodeKind::Event) =>
                {
                    findings.push(hard(
                        ErrorCode::UnresolvedTrigger,
                        format!(
                            "process '{}' trigger '{target}' must be a Command or Event, found {}",
                            node.id, trigger.kind
                        ),
                        format!("{base}.spec.trigger"),
                    ));
                }
                Some(_) => {}
            }
        }
    }

    // Resolution failures on children are phase 2 findings; here only the
    // kind of resolvable children is checked.
    for (pos, child) in node.children().iter().enumerate() {
        let target = ref_target(child);
        if let Some(child_node) = index.node(target) {
            if child_node.kind != NodeKind::Step {
                findings.push(hard(
                    ErrorCode::InvalidProcessChild,
                    format!(
                        "process '{}' child '{target}' must be a Step, found {}",
                        node.id, child_node.kind
                    ),
                    format!("{base}.children[{pos}]"),
                ));
            }
        }
    }
}

fn check_step(node: &Node, base: &str, findings: &mut Vec<ValidationError>) {
    let action_ok = node
        .spec
        .get("action")
        .and_then(Value::as_str)
        .is_some_and(|a| !a.trim().is_empty());
    if !action_ok {
        findings.push(hard(
            ErrorCode::MissingAction,
            format!("step '{}' must declare a non-empty action", node.id),
            format!("{base}.spec.action"),
        ));
    }
}

fn check_scenario(node: &Node, base: &str, findings: &mut Vec<ValidationError>) {
    for clause in ["given", "when", "then"] {
        match node.spec.get(clause) {
            Some(Value::Array(_)) => {}
            Some(_) => findings.push(hard(
                ErrorCode::MissingScenarioClause,
                format!("scenario '{}' clause '{clause}' must be a sequence", node.id),
                format!("{base}.spec.{clause}"),
            )),
            None => findings.push(hard(
                ErrorCode::MissingScenarioClause,
                format!("scenario '{}' must declare '{clause}'", node.id),
                format!("{base}.spec.{clause}"),
            )),
        }
    }
}

fn check_node_contracts(node: &Node, base: &str, findings: &mut Vec<ValidationError>) {
    let Some(contracts) = &node.contracts else { return };
    for (pos, clause) in contracts.iter().enumerate() {
        if !clause.has_body() {
            findings.push(hard(
                ErrorCode::EmptyContractClause,
                format!(
                    "contract clause on '{}' must specify a type, invariant, temporal, or rule",
                    node.id
                ),
                format!("{base}.contracts[{pos}]"),
            ));
        }
    }
}

/// Contract clauses are checked wherever they are attached; hooks may carry
/// one as well.
fn check_hook_contracts(doc: &Document, findings: &mut Vec<ValidationError>) {
    let Some(generation) = &doc.generation else { return };
    for (pos, hook) in generation.hooks.iter().enumerate() {
        if let Some(contract) = &hook.contract {
            if !contract.has_body() {
                findings.push(hard(
                    ErrorCode::EmptyContractClause,
                    "hook contract clause must specify a type, invariant, temporal, or rule"
                        .into(),
                    format!("generation.hooks[{pos}].contract"),
                ));
            }
        }
    }
}
