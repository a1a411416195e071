//! Node index: id lookup and per-kind id sets, derived once per run.

use std::collections::{HashMap, HashSet};

use blueprint_model::{Node, NodeKind};

/// Lookup structures over a document's node sequence.
///
/// The node slice is the arena; the index maps ids to positions in it, so
/// resolution is a lookup rather than a live object reference. Duplicate ids
/// are tolerated here (last write wins) — detecting them is the structural
/// phase's job and must not be masked by index construction.
#[derive(Debug)]
pub struct NodeIndex<'a> {
    nodes: &'a [Node],
    by_id: HashMap<&'a str, usize>,
    entities: HashSet<&'a str>,
    enums: HashSet<&'a str>,
    commands: HashSet<&'a str>,
    events: HashSet<&'a str>,
    steps: HashSet<&'a str>,
}

impl<'a> NodeIndex<'a> {
    /// Build the index in one pass over the node sequence.
    pub fn build(nodes: &'a [Node]) -> Self {
        let mut by_id = HashMap::with_capacity(nodes.len());
        let mut entities = HashSet::new();
        let mut enums = HashSet::new();
        let mut commands = HashSet::new();
        let mut events = HashSet::new();
        let mut steps = HashSet::new();

        for (pos, node) in nodes.iter().enumerate() {
            by_id.insert(node.id.as_str(), pos);
            match node.kind {
                NodeKind::Entity => {
                    entities.insert(node.id.as_str());
                }
                NodeKind::Enum => {
                    enums.insert(node.id.as_str());
                }
                NodeKind::Command => {
                    commands.insert(node.id.as_str());
                }
                NodeKind::Event => {
                    events.insert(node.id.as_str());
                }
                NodeKind::Step => {
                    steps.insert(node.id.as_str());
                }
                _ => {}
            }
        }

        Self {
            nodes,
            by_id,
            entities,
            enums,
            commands,
            events,
            steps,
        }
    }

    /// Resolve an id to its node.
    pub fn node(&self, id: &str) -> Option<&'a Node> {
        self.by_id.get(id).map(|&pos| &self.nodes[pos])
    }

    /// Position of an id in the node sequence.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn is_entity(&self, id: &str) -> bool {
        self.entities.contains(id)
    }

    pub fn is_enum(&self, id: &str) -> bool {
        self.enums.contains(id)
    }

    pub fn is_command(&self, id: &str) -> bool {
        self.commands.contains(id)
    }

    pub fn is_event(&self, id: &str) -> bool {
        self.events.contains(id)
    }

    pub fn is_step(&self, id: &str) -> bool {
        self.steps.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn node(kind: NodeKind, id: &str) -> Node {
        Node {
            kind,
            id: id.into(),
            spec: Map::new(),
            children: None,
            contracts: None,
        }
    }

    #[test]
    fn build_partitions_ids_by_kind() {
        let nodes = vec![
            node(NodeKind::Entity, "entity.user"),
            node(NodeKind::Enum, "enum.status"),
            node(NodeKind::Command, "cmd.create"),
            node(NodeKind::Event, "evt.created"),
            node(NodeKind::Step, "step.persist"),
            node(NodeKind::System, "system.root"),
        ];
        let index = NodeIndex::build(&nodes);

        assert!(index.is_entity("entity.user"));
        assert!(index.is_enum("enum.status"));
        assert!(index.is_command("cmd.create"));
        assert!(index.is_event("evt.created"));
        assert!(index.is_step("step.persist"));

        // System lands in the id map but no kind partition
        assert!(index.contains("system.root"));
        assert!(!index.is_entity("system.root"));
    }

    #[test]
    fn node_lookup_resolves_to_arena_position() {
        let nodes = vec![
            node(NodeKind::Entity, "entity.user"),
            node(NodeKind::Event, "evt.created"),
        ];
        let index = NodeIndex::build(&nodes);

        assert_eq!(index.position("entity.user"), Some(0));
        assert_eq!(index.position("evt.created"), Some(1));
        assert_eq!(index.node("evt.created").map(|n| n.kind), Some(NodeKind::Event));
        assert!(index.node("evt.missing").is_none());
    }

    #[test]
    fn duplicate_ids_last_write_wins() {
        let nodes = vec![
            node(NodeKind::Entity, "thing"),
            node(NodeKind::Event, "thing"),
        ];
        let index = NodeIndex::build(&nodes);

        assert_eq!(index.position("thing"), Some(1));
        assert_eq!(index.node("thing").map(|n| n.kind), Some(NodeKind::Event));
    }

    #[test]
    fn empty_sequence_builds_empty_index() {
        let nodes: Vec<Node> = Vec::new();
        let index = NodeIndex::build(&nodes);
        assert!(!index.contains("anything"));
    }
}
