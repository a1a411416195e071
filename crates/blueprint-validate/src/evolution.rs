//! Phase 4 — version history chain and migration coverage.
//!
//! The history is a singly linked chain by `basedOn`: no gaps, terminating
//! at the project's declared current version. Breaking changes must be
//! accompanied by a migration in their own entry.

use blueprint_model::{Document, HistoryEntry};
use blueprint_types::{ErrorCode, Phase, ValidationError};

const PHASE: Phase = Phase::Evolution;

const MIGRATION_KINDS: [&str; 3] = ["data", "schema", "process"];

fn hard(code: ErrorCode, message: String, location: String) -> ValidationError {
    ValidationError::hard(code, PHASE, message, location)
}

/// Run the evolution phase. Evolution tracking is optional: an absent or
/// empty history makes this a no-op.
pub fn check(doc: &Document) -> Vec<ValidationError> {
    let mut findings = Vec::new();
    if doc.history.is_empty() {
        return findings;
    }

    check_chain(doc, &mut findings);

    for (pos, entry) in doc.history.iter().enumerate() {
        check_migration_coverage(entry, pos, &mut findings);
        check_migration_declarations(entry, pos, &mut findings);
    }

    findings
}

fn check_chain(doc: &Document, findings: &mut Vec<ValidationError>) {
    if let Some(first) = doc.history.first() {
        if let Some(based_on) = &first.based_on {
            findings.push(hard(
                ErrorCode::BrokenChain,
                format!(
                    "first history entry '{}' must have basedOn: null, found '{based_on}'",
                    first.version
                ),
                "history[0].basedOn".into(),
            ));
        }
    }

    for (pos, pair) in doc.history.windows(2).enumerate() {
        let (prev, entry) = (&pair[0], &pair[1]);
        if entry.based_on.as_deref() != Some(prev.version.as_str()) {
            let found = entry.based_on.as_deref().unwrap_or("null");
            findings.push(hard(
                ErrorCode::BrokenChain,
                format!(
                    "entry '{}' is based on '{found}' but follows '{}'",
                    entry.version, prev.version
                ),
                format!("history[{}].basedOn", pos + 1),
            ));
        }
    }

    if let Some(last) = doc.history.last() {
        let current = &doc.project.versioning.current;
        if &last.version != current {
            findings.push(hard(
                ErrorCode::VersionMismatch,
                format!(
                    "declared current version '{current}' does not match the last history entry '{}'",
                    last.version
                ),
                "project.versioning.current".into(),
            ));
        }
    }
}

fn check_migration_coverage(entry: &HistoryEntry, pos: usize, findings: &mut Vec<ValidationError>) {
    for (change_pos, change) in entry.changes.iter().enumerate() {
        // Presence of any migration in the same entry satisfies the
        // requirement; there is no per-change matching knob.
        if change.requires_migration() && entry.migrations.is_empty() {
            findings.push(
                hard(
                    ErrorCode::MissingMigration,
                    format!(
                        "change '{}' on '{}' requires a migration and entry '{}' declares none",
                        change.op, change.target, entry.version
                    ),
                    format!("history[{pos}].changes[{change_pos}]"),
                )
                .with_suggestion("add a migration with kind data, schema, or process"),
            );
        }
    }
}

fn check_migration_declarations(
    entry: &HistoryEntry,
    pos: usize,
    findings: &mut Vec<ValidationError>,
) {
    for (mig_pos, migration) in entry.migrations.iter().enumerate() {
        let base = format!("history[{pos}].migrations[{mig_pos}]");
        let label = migration.id.as_deref().unwrap_or("<unnamed>");

        if migration.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            findings.push(hard(
                ErrorCode::InvalidMigration,
                "migration is missing an id".into(),
                format!("{base}.id"),
            ));
        }

        match migration.kind.as_deref() {
            None => findings.push(hard(
                ErrorCode::InvalidMigration,
                format!("migration '{label}' is missing a kind"),
                format!("{base}.kind"),
            )),
            Some(kind) if !MIGRATION_KINDS.contains(&kind) => findings.push(
                hard(
                    ErrorCode::InvalidMigration,
                    format!("migration '{label}' kind '{kind}' is not recognized"),
                    format!("{base}.kind"),
                )
                .with_suggestion("use one of: data, schema, process"),
            ),
            Some(_) => {}
        }

        if migration.steps.is_empty() {
            findings.push(hard(
                ErrorCode::InvalidMigration,
                format!("migration '{label}' must declare at least one step"),
                format!("{base}.steps"),
            ));
        }
    }
}
