//! Shared types, errors, findings, and results for the Blueprint validator.
//!
//! This crate provides the foundational types used across all other Blueprint crates:
//! - `BlueprintError` — unified error taxonomy
//! - `ValidationError` — a single finding produced by a validation phase
//! - `ValidationResult` — the aggregated outcome of a validation run
//! - `Phase`, `Level`, `ErrorCode` — the closed vocabularies findings are built from

use serde::{Deserialize, Serialize};

/// Unified error type for all Blueprint subsystems.
///
/// Validation findings are *not* errors in this sense: phases return
/// [`ValidationError`] lists and never fail. `BlueprintError` covers the
/// layer below the phases — unreadable input, unparseable source text, a
/// parsed value that cannot be lowered into the typed document model.
#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    #[error("{format} parse error: {message}")]
    ParseError { format: String, message: String },

    #[error("document does not fit the blueprint model: {0}")]
    InvalidDocument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}

/// A convenience alias for `Result<T, BlueprintError>`.
pub type Result<T> = std::result::Result<T, BlueprintError>;

// ---------------------------------------------------------------------------
// Phase — the six validation phases
// ---------------------------------------------------------------------------

/// The validation phase a finding belongs to. Serialized as its number (1-6),
/// matching the wire contract consumed by generation tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Phase {
    Structural,
    Referential,
    Semantic,
    Evolution,
    GenerationSafety,
    Verifiability,
}

impl Phase {
    /// All phases in pipeline order.
    pub const ALL: [Phase; 6] = [
        Phase::Structural,
        Phase::Referential,
        Phase::Semantic,
        Phase::Evolution,
        Phase::GenerationSafety,
        Phase::Verifiability,
    ];

    /// The 1-based phase number.
    pub fn number(self) -> u8 {
        match self {
            Phase::Structural => 1,
            Phase::Referential => 2,
            Phase::Semantic => 3,
            Phase::Evolution => 4,
            Phase::GenerationSafety => 5,
            Phase::Verifiability => 6,
        }
    }

    /// Short lowercase name used in log lines and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            Phase::Structural => "structural",
            Phase::Referential => "referential",
            Phase::Semantic => "semantic",
            Phase::Evolution => "evolution",
            Phase::GenerationSafety => "generation-safety",
            Phase::Verifiability => "verifiability",
        }
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> u8 {
        phase.number()
    }
}

impl TryFrom<u8> for Phase {
    type Error = String;

    fn try_from(n: u8) -> std::result::Result<Phase, String> {
        match n {
            1 => Ok(Phase::Structural),
            2 => Ok(Phase::Referential),
            3 => Ok(Phase::Semantic),
            4 => Ok(Phase::Evolution),
            5 => Ok(Phase::GenerationSafety),
            6 => Ok(Phase::Verifiability),
            other => Err(format!("phase number out of range: {other}")),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "phase {} ({})", self.number(), self.name())
    }
}

// ---------------------------------------------------------------------------
// Level — hard vs soft findings
// ---------------------------------------------------------------------------

/// Severity of a finding. `Hard` blocks downstream generation; `Soft` is
/// advisory and only blocks in strict mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Hard,
    Soft,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Hard => write!(f, "hard"),
            Level::Soft => write!(f, "soft"),
        }
    }
}

// ---------------------------------------------------------------------------
// ErrorCode — one code per validation rule
// ---------------------------------------------------------------------------

/// The closed set of finding codes, one per rule. Serialized in
/// SCREAMING_SNAKE_CASE so generation tooling can match on stable strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Phase 1 — structural
    ParseFailed,
    InvalidSpecTag,
    MissingProjectId,
    MissingVersioning,
    MissingStructureRoot,
    MissingDomainNodes,
    MalformedNode,
    InvalidNodeKind,
    InvalidNodeId,
    DuplicateNodeId,
    InvalidNodeSpec,
    InvalidChildren,

    // Phase 2 — referential
    UnresolvedReference,
    InvalidRootKind,
    CircularChildren,

    // Phase 3 — semantic
    MissingFields,
    MissingFieldType,
    UnresolvedRefType,
    InvalidEnumType,
    MissingValues,
    MissingGoals,
    MissingInput,
    MissingOutput,
    MissingPayload,
    UnresolvedEffectEvent,
    UnresolvedEffectEntity,
    MissingTrigger,
    UnresolvedTrigger,
    InvalidProcessChild,
    MissingAction,
    MissingScenarioClause,
    EmptyContractClause,

    // Phase 4 — evolution
    BrokenChain,
    VersionMismatch,
    MissingMigration,
    InvalidMigration,

    // Phase 5 — generation safety
    InvalidZone,
    OverlappingZones,
    MissingHookId,
    DuplicateHookId,
    InvalidHookLocation,
    HookInOverwrite,

    // Phase 6 — verifiability
    MissingPipeline,
    EmptyPipelineCmd,
    LowScenarioCoverage,
}

impl ErrorCode {
    /// The stable SCREAMING_SNAKE_CASE name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ParseFailed => "PARSE_FAILED",
            ErrorCode::InvalidSpecTag => "INVALID_SPEC_TAG",
            ErrorCode::MissingProjectId => "MISSING_PROJECT_ID",
            ErrorCode::MissingVersioning => "MISSING_VERSIONING",
            ErrorCode::MissingStructureRoot => "MISSING_STRUCTURE_ROOT",
            ErrorCode::MissingDomainNodes => "MISSING_DOMAIN_NODES",
            ErrorCode::MalformedNode => "MALFORMED_NODE",
            ErrorCode::InvalidNodeKind => "INVALID_NODE_KIND",
            ErrorCode::InvalidNodeId => "INVALID_NODE_ID",
            ErrorCode::DuplicateNodeId => "DUPLICATE_NODE_ID",
            ErrorCode::InvalidNodeSpec => "INVALID_NODE_SPEC",
            ErrorCode::InvalidChildren => "INVALID_CHILDREN",
            ErrorCode::UnresolvedReference => "UNRESOLVED_REFERENCE",
            ErrorCode::InvalidRootKind => "INVALID_ROOT_KIND",
            ErrorCode::CircularChildren => "CIRCULAR_CHILDREN",
            ErrorCode::MissingFields => "MISSING_FIELDS",
            ErrorCode::MissingFieldType => "MISSING_FIELD_TYPE",
            ErrorCode::UnresolvedRefType => "UNRESOLVED_REF_TYPE",
            ErrorCode::InvalidEnumType => "INVALID_ENUM_TYPE",
            ErrorCode::MissingValues => "MISSING_VALUES",
            ErrorCode::MissingGoals => "MISSING_GOALS",
            ErrorCode::MissingInput => "MISSING_INPUT",
            ErrorCode::MissingOutput => "MISSING_OUTPUT",
            ErrorCode::MissingPayload => "MISSING_PAYLOAD",
            ErrorCode::UnresolvedEffectEvent => "UNRESOLVED_EFFECT_EVENT",
            ErrorCode::UnresolvedEffectEntity => "UNRESOLVED_EFFECT_ENTITY",
            ErrorCode::MissingTrigger => "MISSING_TRIGGER",
            ErrorCode::UnresolvedTrigger => "UNRESOLVED_TRIGGER",
            ErrorCode::InvalidProcessChild => "INVALID_PROCESS_CHILD",
            ErrorCode::MissingAction => "MISSING_ACTION",
            ErrorCode::MissingScenarioClause => "MISSING_SCENARIO_CLAUSE",
            ErrorCode::EmptyContractClause => "EMPTY_CONTRACT_CLAUSE",
            ErrorCode::BrokenChain => "BROKEN_CHAIN",
            ErrorCode::VersionMismatch => "VERSION_MISMATCH",
            ErrorCode::MissingMigration => "MISSING_MIGRATION",
            ErrorCode::InvalidMigration => "INVALID_MIGRATION",
            ErrorCode::InvalidZone => "INVALID_ZONE",
            ErrorCode::OverlappingZones => "OVERLAPPING_ZONES",
            ErrorCode::MissingHookId => "MISSING_HOOK_ID",
            ErrorCode::DuplicateHookId => "DUPLICATE_HOOK_ID",
            ErrorCode::InvalidHookLocation => "INVALID_HOOK_LOCATION",
            ErrorCode::HookInOverwrite => "HOOK_IN_OVERWRITE",
            ErrorCode::MissingPipeline => "MISSING_PIPELINE",
            ErrorCode::EmptyPipelineCmd => "EMPTY_PIPELINE_CMD",
            ErrorCode::LowScenarioCoverage => "LOW_SCENARIO_COVERAGE",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ValidationError — a single finding
// ---------------------------------------------------------------------------

/// A single finding produced by a validation phase.
///
/// `location` is a path string into the document (`domain.nodes[3].spec`),
/// empty for document-level findings. `suggestion` is an optional human
/// remediation hint; `context` carries structured extras such as a cycle path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub phase: Phase,
    pub level: Level,
    pub message: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl ValidationError {
    /// Create a `hard` finding.
    pub fn hard(
        code: ErrorCode,
        phase: Phase,
        message: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            code,
            phase,
            level: Level::Hard,
            message: message.into(),
            location: location.into(),
            suggestion: None,
            context: None,
        }
    }

    /// Create a `soft` finding.
    pub fn soft(
        code: ErrorCode,
        phase: Phase,
        message: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            level: Level::Soft,
            ..Self::hard(code, phase, message, location)
        }
    }

    /// Attach a remediation hint.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Attach structured context data.
    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }

    pub fn is_hard(&self) -> bool {
        self.level == Level::Hard
    }
}

// ---------------------------------------------------------------------------
// ValidationResult — the aggregated outcome of a run
// ---------------------------------------------------------------------------

/// Aggregated outcome of a validation run.
///
/// In non-strict mode `errors` holds the hard findings and `warnings` the
/// soft ones; the verdict ignores warnings. In strict mode every finding
/// lands in `errors`, `warnings` stays empty, and any finding fails the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationError>,
    /// The last phase attempted before the run completed or halted.
    pub phase: Phase,
}

impl ValidationResult {
    /// Build a result from the collected findings of a run.
    pub fn from_findings(findings: Vec<ValidationError>, phase: Phase, strict: bool) -> Self {
        if strict {
            let ok = findings.is_empty();
            return Self {
                ok,
                errors: findings,
                warnings: Vec::new(),
                phase,
            };
        }
        let (errors, warnings): (Vec<_>, Vec<_>) =
            findings.into_iter().partition(ValidationError::is_hard);
        Self {
            ok: errors.is_empty(),
            errors,
            warnings,
            phase,
        }
    }

    /// A failed result carrying a single hard finding.
    pub fn failure(finding: ValidationError) -> Self {
        let phase = finding.phase;
        Self {
            ok: false,
            errors: vec![finding],
            warnings: Vec::new(),
            phase,
        }
    }
}
