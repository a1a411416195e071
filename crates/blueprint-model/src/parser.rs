use blueprint_types::{BlueprintError, Result};
use serde_json::Value;

use crate::ast::Document;

/// Parse blueprint source text into a raw JSON value.
///
/// Text leading with `{` is parsed as JSON, everything else as YAML. The raw
/// value is what the structural phase validates; it is lowered into a typed
/// [`Document`] only after that phase passes.
pub fn parse(source: &str) -> Result<Value> {
    if source.trim_start().starts_with('{') {
        serde_json::from_str(source).map_err(|err| BlueprintError::ParseError {
            format: "JSON".into(),
            message: err.to_string(),
        })
    } else {
        serde_yaml::from_str(source).map_err(|err| BlueprintError::ParseError {
            format: "YAML".into(),
            message: err.to_string(),
        })
    }
}

/// Lower a raw value into the typed document model.
///
/// Callers run structural validation on the raw value first; a value that
/// still fails lowering is reported through the same parse-failure path.
pub fn to_document(value: &Value) -> Result<Document> {
    let doc: Document = serde_json::from_value(value.clone())
        .map_err(|err| BlueprintError::InvalidDocument(err.to_string()))?;
    tracing::debug!(
        project = %doc.project.id,
        nodes = doc.domain.nodes.len(),
        "lowered blueprint document"
    );
    Ok(doc)
}

/// Parse and lower in one step. Convenience for callers that do not need the
/// raw value, such as the CLI `info` command.
pub fn parse_document(source: &str) -> Result<Document> {
    to_document(&parse(source)?)
}
