use blueprint_types::Level;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `spec` tag every blueprint document must carry.
pub const SPEC_TAG: &str = "blueprint/v1";

/// A parsed blueprint document. Immutable once constructed; the validator
/// never mutates it.
///
/// Fields checked by the structural phase (project, structure, domain) are
/// typed strictly — lowering only happens after that phase passes clean.
/// Sections checked by later phases (node specs, history, generation) are
/// typed leniently so a malformed section surfaces as a finding in its own
/// phase rather than as a lowering failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub spec: String,
    pub project: Project,
    pub structure: Structure,
    pub domain: Domain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<Generation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tests: Option<TestsSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub versioning: Versioning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Versioning {
    pub strategy: String,
    pub current: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    /// Symbolic reference to the root node; must resolve to a System node.
    pub root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub nodes: Vec<Node>,
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// The closed set of node kinds. Adding a variant forces every semantic
/// dispatch site to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    System,
    Module,
    Entity,
    Enum,
    Value,
    Interface,
    Command,
    Event,
    Query,
    Process,
    Step,
    Policy,
    Scenario,
    Contract,
}

impl NodeKind {
    pub const ALL: [NodeKind; 14] = [
        NodeKind::System,
        NodeKind::Module,
        NodeKind::Entity,
        NodeKind::Enum,
        NodeKind::Value,
        NodeKind::Interface,
        NodeKind::Command,
        NodeKind::Event,
        NodeKind::Query,
        NodeKind::Process,
        NodeKind::Step,
        NodeKind::Policy,
        NodeKind::Scenario,
        NodeKind::Contract,
    ];

    /// The tag string as written in source documents.
    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::System => "System",
            NodeKind::Module => "Module",
            NodeKind::Entity => "Entity",
            NodeKind::Enum => "Enum",
            NodeKind::Value => "Value",
            NodeKind::Interface => "Interface",
            NodeKind::Command => "Command",
            NodeKind::Event => "Event",
            NodeKind::Query => "Query",
            NodeKind::Process => "Process",
            NodeKind::Step => "Step",
            NodeKind::Policy => "Policy",
            NodeKind::Scenario => "Scenario",
            NodeKind::Contract => "Contract",
        }
    }

    /// Look up a kind by its source tag.
    pub fn from_tag(tag: &str) -> Option<NodeKind> {
        NodeKind::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single node of the specification graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub id: String,
    /// Kind-dependent payload, interpreted by the semantic phase.
    #[serde(default)]
    pub spec: Map<String, Value>,
    /// Symbolic references to child nodes. Graph edges, not ownership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contracts: Option<Vec<ContractClause>>,
}

impl Node {
    /// The node's children as a slice, empty when the key is absent.
    pub fn children(&self) -> &[String] {
        self.children.as_deref().unwrap_or_default()
    }
}

/// A contract clause attached to a node: an invariant expression, a temporal
/// expression, or a named rule. Expressions are carried as opaque strings;
/// evaluation is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractClause {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub clause_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invariant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
    #[serde(default = "default_clause_level")]
    pub level: Level,
}

fn default_clause_level() -> Level {
    Level::Hard
}

impl ContractClause {
    /// Whether the clause carries at least one non-blank body field.
    pub fn has_body(&self) -> bool {
        [&self.clause_type, &self.invariant, &self.temporal, &self.rule]
            .into_iter()
            .any(|field| field.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// One entry of the version history chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub version: String,
    /// Previous version in the chain; null only for the first entry.
    #[serde(rename = "basedOn", default)]
    pub based_on: Option<String>,
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub migrations: Vec<Migration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeOp {
    AddField,
    RemoveField,
    RenameField,
    TypeChange,
    AddNode,
    RemoveNode,
    RenameNode,
}

impl ChangeOp {
    pub fn tag(self) -> &'static str {
        match self {
            ChangeOp::AddField => "add-field",
            ChangeOp::RemoveField => "remove-field",
            ChangeOp::RenameField => "rename-field",
            ChangeOp::TypeChange => "type-change",
            ChangeOp::AddNode => "add-node",
            ChangeOp::RemoveNode => "remove-node",
            ChangeOp::RenameNode => "rename-node",
        }
    }
}

impl std::fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// A single change operation recorded against a version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Change {
    pub op: ChangeOp,
    /// The node id the change applies to.
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl Change {
    /// Whether this change is breaking and must be accompanied by a
    /// migration in its history entry.
    pub fn requires_migration(&self) -> bool {
        match self.op {
            ChangeOp::RemoveField
            | ChangeOp::RenameField
            | ChangeOp::TypeChange
            | ChangeOp::RemoveNode
            | ChangeOp::RenameNode => true,
            ChangeOp::AddField => self.required == Some(true),
            ChangeOp::AddNode => false,
        }
    }
}

/// A declared data/schema/process transformation accompanying a breaking
/// change. Typed leniently; the evolution phase validates the fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Migration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub steps: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validate: Vec<Value>,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub hooks: Vec<Hook>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipelines: Option<Pipelines>,
}

/// A declared region of generated output and its regeneration policy.
/// Typed leniently; the generation-safety phase validates the fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// A named, anchor-delimited region reserved for user-authored code inside
/// an otherwise generated file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hook {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<HookLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<ContractClause>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(rename = "anchorStart", default, skip_serializing_if = "Option::is_none")]
    pub anchor_start: Option<String>,
    #[serde(rename = "anchorEnd", default, skip_serializing_if = "Option::is_none")]
    pub anchor_end: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipelines {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<PipelineSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<PipelineSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub migrate: Option<PipelineSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests section
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestsSection {
    /// Symbolic references to Scenario nodes.
    #[serde(default)]
    pub scenarios: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_tag_round_trip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(NodeKind::from_tag("Widget"), None);
    }

    #[test]
    fn node_kind_serializes_as_source_tag() {
        assert_eq!(
            serde_json::to_string(&NodeKind::Entity).unwrap(),
            "\"Entity\""
        );
        let kind: NodeKind = serde_json::from_str("\"Scenario\"").unwrap();
        assert_eq!(kind, NodeKind::Scenario);
    }

    #[test]
    fn change_op_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ChangeOp::RemoveField).unwrap(),
            "\"remove-field\""
        );
        let op: ChangeOp = serde_json::from_str("\"type-change\"").unwrap();
        assert_eq!(op, ChangeOp::TypeChange);
    }

    #[test]
    fn contract_clause_level_defaults_to_hard() {
        let clause: ContractClause =
            serde_json::from_str(r#"{"invariant": "balance >= 0"}"#).unwrap();
        assert_eq!(clause.level, Level::Hard);
        assert!(clause.has_body());
    }

    #[test]
    fn contract_clause_without_body_fields() {
        let clause: ContractClause = serde_json::from_str(r#"{"level": "soft"}"#).unwrap();
        assert_eq!(clause.level, Level::Soft);
        assert!(!clause.has_body());
    }

    #[test]
    fn contract_clause_blank_strings_do_not_count_as_body() {
        let clause: ContractClause =
            serde_json::from_str(r#"{"invariant": "   ", "rule": ""}"#).unwrap();
        assert!(!clause.has_body());
    }

    #[test]
    fn node_children_helper_defaults_to_empty() {
        let node: Node = serde_json::from_str(
            r#"{"kind": "Module", "id": "mod.core", "spec": {}}"#,
        )
        .unwrap();
        assert!(node.children().is_empty());
    }

    #[test]
    fn requires_migration_for_breaking_ops() {
        let change = |op: ChangeOp, required: Option<bool>| Change {
            op,
            target: "entity.user".into(),
            field: None,
            type_name: None,
            from: None,
            to: None,
            required,
        };

        assert!(change(ChangeOp::RemoveField, None).requires_migration());
        assert!(change(ChangeOp::RenameField, None).requires_migration());
        assert!(change(ChangeOp::TypeChange, None).requires_migration());
        assert!(change(ChangeOp::RemoveNode, None).requires_migration());
        assert!(change(ChangeOp::RenameNode, None).requires_migration());
        assert!(!change(ChangeOp::AddNode, None).requires_migration());
        assert!(!change(ChangeOp::AddField, None).requires_migration());
        assert!(!change(ChangeOp::AddField, Some(false)).requires_migration());
        assert!(change(ChangeOp::AddField, Some(true)).requires_migration());
    }

    #[test]
    fn history_entry_based_on_accepts_null() {
        let entry: HistoryEntry =
            serde_json::from_str(r#"{"version": "1.0.0", "basedOn": null}"#).unwrap();
        assert_eq!(entry.version, "1.0.0");
        assert!(entry.based_on.is_none());
        assert!(entry.changes.is_empty());
        assert!(entry.migrations.is_empty());
    }

    #[test]
    fn hook_location_uses_camel_case_anchors() {
        let loc: HookLocation = serde_json::from_str(
            r#"{"file": "src/api.rs", "anchorStart": "// begin", "anchorEnd": "// end"}"#,
        )
        .unwrap();
        assert_eq!(loc.anchor_start.as_deref(), Some("// begin"));
        assert_eq!(loc.anchor_end.as_deref(), Some("// end"));
    }
}
