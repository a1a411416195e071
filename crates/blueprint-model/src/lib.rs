//! Typed document model and YAML/JSON parsing for Blueprint spec documents.
//!
//! Parses blueprint source text into a raw `serde_json::Value` and lowers it
//! into a typed AST: [`Document`], [`Node`], [`NodeKind`], [`HistoryEntry`],
//! [`Generation`]. Structural validation runs against the raw value; every
//! later phase consumes the typed form.
//!
//! # Example
//! ```
//! let yaml = r#"
//! spec: blueprint/v1
//! project:
//!   id: my.app
//!   versioning: {strategy: semver, current: "1.0.0"}
//! structure:
//!   root: NodeRef(system.root)
//! domain:
//!   nodes:
//!     - kind: System
//!       id: system.root
//!       spec:
//!         goals: [demo]
//! "#;
//! let doc = blueprint_model::parse_document(yaml).unwrap();
//! assert_eq!(doc.domain.nodes.len(), 1);
//! ```

pub mod ast;
mod parser;

pub use ast::*;
pub use parser::{parse, parse_document, to_document};

/// Extract the target id from a symbolic reference.
///
/// References are written `NodeRef(<id>)`; a bare id is accepted as a
/// shorthand for the same target.
pub fn ref_target(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("NodeRef(")
        .and_then(|rest| rest.strip_suffix(')'))
        .map(str::trim)
        .unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ref_target_strips_wrapper() {
        assert_eq!(ref_target("NodeRef(entity.user)"), "entity.user");
    }

    #[test]
    fn ref_target_accepts_bare_id() {
        assert_eq!(ref_target("entity.user"), "entity.user");
    }

    #[test]
    fn ref_target_trims_whitespace() {
        assert_eq!(ref_target("  NodeRef( entity.user )  "), "entity.user");
    }

    #[test]
    fn ref_target_leaves_unbalanced_text_alone() {
        assert_eq!(ref_target("NodeRef(entity.user"), "NodeRef(entity.user");
    }
}
