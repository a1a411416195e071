//! Phase 6 — pipeline presence and scenario coverage.
//!
//! The only hard conditions here are missing or empty build/test/migrate
//! pipelines. Scenario coverage is advisory: an uncovered Command is a soft
//! finding and never blocks on its own.

use std::collections::HashSet;

use blueprint_model::{ref_target, Document, NodeKind};
use blueprint_types::{ErrorCode, Phase, ValidationError};
use serde_json::Value;

const PHASE: Phase = Phase::Verifiability;

/// Run the verifiability phase.
pub fn check(doc: &Document) -> Vec<ValidationError> {
    let mut findings = Vec::new();
    check_pipelines(doc, &mut findings);
    check_scenario_coverage(doc, &mut findings);
    findings
}

fn check_pipelines(doc: &Document, findings: &mut Vec<ValidationError>) {
    let Some(pipelines) = doc.generation.as_ref().and_then(|g| g.pipelines.as_ref()) else {
        return;
    };

    for (name, declared) in [
        ("build", &pipelines.build),
        ("test", &pipelines.test),
        ("migrate", &pipelines.migrate),
    ] {
        let base = format!("generation.pipelines.{name}");
        match declared {
            None => findings.push(ValidationError::hard(
                ErrorCode::MissingPipeline,
                PHASE,
                format!("the '{name}' pipeline must be declared"),
                base,
            )),
            Some(pipeline) => {
                let cmd_ok = pipeline
                    .cmd
                    .as_deref()
                    .is_some_and(|cmd| !cmd.trim().is_empty());
                if !cmd_ok {
                    findings.push(ValidationError::hard(
                        ErrorCode::EmptyPipelineCmd,
                        PHASE,
                        format!("the '{name}' pipeline must declare a non-empty cmd"),
                        format!("{base}.cmd"),
                    ));
                }
            }
        }
    }
}

/// Every Command is checked against the commands referenced by Scenario
/// `when` clauses. Not gated on pipelines being present.
fn check_scenario_coverage(doc: &Document, findings: &mut Vec<ValidationError>) {
    let covered = covered_commands(doc);

    for (pos, node) in doc.domain.nodes.iter().enumerate() {
        if node.kind == NodeKind::Command && !covered.contains(node.id.as_str()) {
            findings.push(
                ValidationError::soft(
                    ErrorCode::LowScenarioCoverage,
                    PHASE,
                    format!(
                        "command '{}' is not exercised by any scenario's when clause",
                        node.id
                    ),
                    format!("domain.nodes[{pos}]"),
                )
                .with_suggestion(format!(
                    "add a Scenario whose when clause references '{}'",
                    node.id
                )),
            );
        }
    }
}

/// Command ids referenced by any Scenario's `when` entries. String entries
/// are read as references; mapping entries contribute their `command` key.
fn covered_commands(doc: &Document) -> HashSet<&str> {
    let mut covered = HashSet::new();
    for node in &doc.domain.nodes {
        if node.kind != NodeKind::Scenario {
            continue;
        }
        let Some(Value::Array(entries)) = node.spec.get("when") else {
            continue;
        };
        for entry in entries {
            match entry {
                Value::String(reference) => {
                    covered.insert(ref_target(reference));
                }
                Value::Object(map) => {
                    if let Some(Value::String(reference)) = map.get("command") {
                        covered.insert(ref_target(reference));
                    }
                }
                _ => {}
            }
        }
    }
    covered
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_model::parse_document;
    use blueprint_types::Level;

    fn run(body: &str) -> Vec<ValidationError> {
        let source = format!(
            r#"
spec: blueprint/v1
project:
  id: my.app
  versioning:
    strategy: semver
    current: "1.0.0"
structure:
  root: NodeRef(system.root)
{body}"#
        );
        check(&parse_document(&source).unwrap())
    }

    fn codes(findings: &[ValidationError]) -> Vec<ErrorCode> {
        findings.iter().map(|f| f.code).collect()
    }

    const BARE_SYSTEM: &str = r#"domain:
  nodes:
    - kind: System
      id: system.root
      spec: {goals: [demo]}
"#;

    #[test]
    fn absent_pipelines_and_commands_is_clean() {
        assert!(run(BARE_SYSTEM).is_empty());
    }

    #[test]
    fn declared_pipelines_must_be_complete() {
        let findings = run(&format!(
            r#"{BARE_SYSTEM}generation:
  pipelines:
    build: {{cmd: "cargo build"}}
    test: {{cmd: "  "}}
"#
        ));
        assert_eq!(
            codes(&findings),
            vec![ErrorCode::EmptyPipelineCmd, ErrorCode::MissingPipeline]
        );
        assert_eq!(findings[0].location, "generation.pipelines.test.cmd");
        assert_eq!(findings[1].location, "generation.pipelines.migrate");
        assert!(findings.iter().all(ValidationError::is_hard));
    }

    #[test]
    fn complete_pipelines_pass() {
        let findings = run(&format!(
            r#"{BARE_SYSTEM}generation:
  pipelines:
    build: {{cmd: "cargo build"}}
    test: {{cmd: "cargo test"}}
    migrate: {{cmd: "cargo run -p migrate"}}
"#
        ));
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn uncovered_command_is_a_soft_finding() {
        let findings = run(
            r#"domain:
  nodes:
    - kind: System
      id: system.root
      spec: {goals: [demo]}
    - kind: Command
      id: cmd.create
      spec: {input: {}}
"#,
        );
        assert_eq!(codes(&findings), vec![ErrorCode::LowScenarioCoverage]);
        assert_eq!(findings[0].level, Level::Soft);
        assert_eq!(findings[0].location, "domain.nodes[1]");
    }

    #[test]
    fn command_referenced_by_when_string_is_covered() {
        let findings = run(
            r#"domain:
  nodes:
    - kind: System
      id: system.root
      spec: {goals: [demo]}
    - kind: Command
      id: cmd.create
      spec: {input: {}}
    - kind: Scenario
      id: scenario.create
      spec:
        given: []
        when: [NodeRef(cmd.create)]
        then: []
"#,
        );
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn command_referenced_by_when_mapping_is_covered() {
        let findings = run(
            r#"domain:
  nodes:
    - kind: System
      id: system.root
      spec: {goals: [demo]}
    - kind: Command
      id: cmd.create
      spec: {input: {}}
    - kind: Scenario
      id: scenario.create
      spec:
        given: []
        when:
          - {command: cmd.create, with: {name: demo}}
        then: []
"#,
        );
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn coverage_runs_without_pipelines_declared() {
        // Coverage is not gated on generation.pipelines being present.
        let findings = run(
            r#"domain:
  nodes:
    - kind: System
      id: system.root
      spec: {goals: [demo]}
    - kind: Command
      id: cmd.orphan
      spec: {input: {}}
generation:
  zones:
    - {path: "src/**", mode: overwrite}
"#,
        );
        assert_eq!(codes(&findings), vec![ErrorCode::LowScenarioCoverage]);
    }

    #[test]
    fn one_finding_per_uncovered_command() {
        let findings = run(
            r#"domain:
  nodes:
    - kind: System
      id: system.root
      spec: {goals: [demo]}
    - kind: Command
      id: cmd.one
      spec: {input: {}}
    - kind: Command
      id: cmd.two
      spec: {input: {}}
    - kind: Scenario
      id: scenario.one
      spec:
        given: []
        when: [cmd.one]
        then: []
"#,
        );
        assert_eq!(codes(&findings), vec![ErrorCode::LowScenarioCoverage]);
        assert!(findings[0].message.contains("cmd.two"));
    }
}
