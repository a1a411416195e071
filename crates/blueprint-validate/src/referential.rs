//! Phase 2 — reference resolution and cycle detection.
//!
//! Resolves every symbolic reference (structure root, children entries,
//! scenario references) against the node index and walks the `children`
//! relation for cycles. The walk is an iterative depth-first traversal with
//! an explicit stack, so documents with thousands of nodes cannot overflow
//! the call stack, and a global visited set keeps the cost at
//! O(nodes + edges) even when subtrees are shared between many roots.

use std::collections::HashSet;

use blueprint_model::{ref_target, Document, Node, NodeKind};
use blueprint_types::{ErrorCode, Phase, ValidationError};

use crate::index::NodeIndex;

const PHASE: Phase = Phase::Referential;

/// Run the referential phase.
pub fn check(doc: &Document, index: &NodeIndex) -> Vec<ValidationError> {
    let mut findings = Vec::new();

    check_root(doc, index, &mut findings);
    check_children_refs(doc, index, &mut findings);
    check_scenario_refs(doc, index, &mut findings);
    detect_cycles(doc, index, &mut findings);

    findings
}

fn check_root(doc: &Document, index: &NodeIndex, findings: &mut Vec<ValidationError>) {
    let target = ref_target(&doc.structure.root);
    match index.node(target) {
        None => findings.push(
            ValidationError::hard(
                ErrorCode::UnresolvedReference,
                PHASE,
                format!("root reference '{target}' does not resolve to any node"),
                "structure.root",
            )
            .with_suggestion(format!("declare a System node with id '{target}'")),
        ),
        Some(node) if node.kind != NodeKind::System => findings.push(ValidationError::hard(
            ErrorCode::InvalidRootKind,
            PHASE,
            format!(
                "root reference '{target}' resolves to a {} node; the root must be a System",
                node.kind
            ),
            "structure.root",
        )),
        Some(_) => {}
    }
}

fn check_children_refs(doc: &Document, index: &NodeIndex, findings: &mut Vec<ValidationError>) {
    for (pos, node) in doc.domain.nodes.iter().enumerate() {
        for (child_pos, child) in node.children().iter().enumerate() {
            let target = ref_target(child);
            if !index.contains(target) {
                findings.push(ValidationError::hard(
                    ErrorCode::UnresolvedReference,
                    PHASE,
                    format!(
                        "child reference '{target}' of node '{}' does not resolve",
                        node.id
                    ),
                    format!("domain.nodes[{pos}].children[{child_pos}]"),
                ));
            }
        }
    }
}

fn check_scenario_refs(doc: &Document, index: &NodeIndex, findings: &mut Vec<ValidationError>) {
    let Some(tests) = &doc.tests else { return };
    for (pos, reference) in tests.scenarios.iter().enumerate() {
        let target = ref_target(reference);
        if !index.contains(target) {
            findings.push(ValidationError::hard(
                ErrorCode::UnresolvedReference,
                PHASE,
                format!("scenario reference '{target}' does not resolve"),
                format!("tests.scenarios[{pos}]"),
            ));
        }
    }
}

/// Walk the `children` relation from every node, reporting each back edge as
/// a circular-reference finding naming the full cycle path. Unresolved
/// children are skipped here; resolution failures are already reported.
fn detect_cycles(doc: &Document, index: &NodeIndex, findings: &mut Vec<ValidationError>) {
    let mut done: HashSet<&str> = HashSet::new();

    for root in &doc.domain.nodes {
        if done.contains(root.id.as_str()) {
            continue;
        }

        // Explicit DFS stack: (node, index of the next child to visit).
        let mut stack: Vec<(&Node, usize)> = vec![(root, 0)];
        let mut on_stack: HashSet<&str> = HashSet::new();
        let mut path: Vec<&str> = Vec::new();
        on_stack.insert(root.id.as_str());
        path.push(root.id.as_str());

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let child_pos = frame.1;
            frame.1 += 1;

            let children = node.children();
            if child_pos >= children.len() {
                done.insert(node.id.as_str());
                on_stack.remove(node.id.as_str());
                path.pop();
                stack.pop();
                continue;
            }

            let target = ref_target(&children[child_pos]);
            let Some(child) = index.node(target) else {
                continue;
            };

            if on_stack.contains(target) {
                let start = path.iter().position(|id| *id == target).unwrap_or(0);
                let mut cycle: Vec<&str> = path[start..].to_vec();
                cycle.push(target);
                let node_pos = index.position(node.id.as_str()).unwrap_or(0);
                findings.push(
                    ValidationError::hard(
                        ErrorCode::CircularChildren,
                        PHASE,
                        format!("circular children reference: {}", cycle.join(" -> ")),
                        format!("domain.nodes[{node_pos}].children[{child_pos}]"),
                    )
                    .with_context(serde_json::json!(cycle))
                    .with_suggestion("break the cycle by removing one child edge"),
                );
            } else if !done.contains(target) {
                on_stack.insert(child.id.as_str());
                path.push(child.id.as_str());
                stack.push((child, 0));
            }
        }
    }
}
