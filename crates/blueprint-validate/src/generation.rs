//! Phase 5 — generation zone coverage and hook placement.
//!
//! Zone overlap is a path string-equality check, not glob-range
//! intersection: `a/**` and `a/b/**` are not flagged even though they
//! overlap. Downstream tooling depends on the looser check, so it stays.
//! Hook files are matched against overwrite zones with real glob semantics
//! (`*` within a path segment, `**` across segments).

use std::collections::HashSet;

use blueprint_model::{Document, Generation};
use blueprint_types::{ErrorCode, Phase, ValidationError};
use globset::{GlobBuilder, GlobMatcher};

const PHASE: Phase = Phase::GenerationSafety;

const ZONE_MODES: [&str; 4] = ["overwrite", "anchored", "preserve", "spec-controlled"];

fn hard(code: ErrorCode, message: String, location: String) -> ValidationError {
    ValidationError::hard(code, PHASE, message, location)
}

/// Run the generation-safety phase. A document without a generation section
/// is a no-op.
pub fn check(doc: &Document) -> Vec<ValidationError> {
    let Some(generation) = &doc.generation else {
        return Vec::new();
    };

    let mut findings = Vec::new();
    let overwrite_matchers = check_zones(generation, &mut findings);
    check_hooks(generation, &overwrite_matchers, &mut findings);
    findings
}

/// Validate zones and collect glob matchers for every overwrite zone, so
/// hook placement can be checked against them afterwards.
fn check_zones(
    generation: &Generation,
    findings: &mut Vec<ValidationError>,
) -> Vec<(String, GlobMatcher)> {
    let mut seen_paths: HashSet<&str> = HashSet::new();
    let mut overwrite_matchers = Vec::new();

    for (pos, zone) in generation.zones.iter().enumerate() {
        let base = format!("generation.zones[{pos}]");

        let path = zone.path.as_deref().filter(|p| !p.trim().is_empty());
        if path.is_none() {
            findings.push(hard(
                ErrorCode::InvalidZone,
                "zone is missing a path".into(),
                format!("{base}.path"),
            ));
        }

        let mode = zone.mode.as_deref();
        match mode {
            None => findings.push(hard(
                ErrorCode::InvalidZone,
                "zone is missing a mode".into(),
                format!("{base}.mode"),
            )),
            Some(m) if !ZONE_MODES.contains(&m) => findings.push(
                hard(
                    ErrorCode::InvalidZone,
                    format!("zone mode '{m}' is not recognized"),
                    format!("{base}.mode"),
                )
                .with_suggestion("use one of: overwrite, anchored, preserve, spec-controlled"),
            ),
            Some(_) => {}
        }

        let Some(path) = path else { continue };

        if !seen_paths.insert(path) {
            findings.push(
                hard(
                    ErrorCode::OverlappingZones,
                    format!("zone path '{path}' is declared more than once"),
                    format!("{base}.path"),
                )
                .with_suggestion("merge the duplicate zones or give them disjoint paths"),
            );
        }

        if mode == Some("overwrite") {
            match GlobBuilder::new(path).literal_separator(true).build() {
                Ok(glob) => overwrite_matchers.push((path.to_owned(), glob.compile_matcher())),
                Err(err) => findings.push(hard(
                    ErrorCode::InvalidZone,
                    format!("zone path '{path}' is not a valid glob: {err}"),
                    format!("{base}.path"),
                )),
            }
        }
    }

    overwrite_matchers
}

fn check_hooks(
    generation: &Generation,
    overwrite_matchers: &[(String, GlobMatcher)],
    findings: &mut Vec<ValidationError>,
) {
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for (pos, hook) in generation.hooks.iter().enumerate() {
        let base = format!("generation.hooks[{pos}]");

        let label = match hook.id.as_deref().filter(|id| !id.trim().is_empty()) {
            None => {
                findings.push(hard(
                    ErrorCode::MissingHookId,
                    "hook is missing an id".into(),
                    format!("{base}.id"),
                ));
                "<unnamed>"
            }
            Some(id) => {
                if !seen_ids.insert(id) {
                    findings.push(hard(
                        ErrorCode::DuplicateHookId,
                        format!("duplicate hook id '{id}'"),
                        format!("{base}.id"),
                    ));
                }
                id
            }
        };

        let Some(location) = &hook.location else {
            findings.push(hard(
                ErrorCode::InvalidHookLocation,
                format!("hook '{label}' is missing a location"),
                format!("{base}.location"),
            ));
            continue;
        };

        let file = location.file.as_deref().filter(|f| !f.trim().is_empty());
        if file.is_none() {
            findings.push(hard(
                ErrorCode::InvalidHookLocation,
                format!("hook '{label}' location is missing a file"),
                format!("{base}.location.file"),
            ));
        }
        let anchor_start = location.anchor_start.as_deref();
        let anchor_end = location.anchor_end.as_deref();
        for (anchor, key) in [(anchor_start, "anchorStart"), (anchor_end, "anchorEnd")] {
            if anchor.map_or(true, |a| a.trim().is_empty()) {
                findings.push(hard(
                    ErrorCode::InvalidHookLocation,
                    format!("hook '{label}' location is missing {key}"),
                    format!("{base}.location.{key}"),
                ));
            }
        }
        if let (Some(start), Some(end)) = (anchor_start, anchor_end) {
            if start == end {
                findings.push(hard(
                    ErrorCode::InvalidHookLocation,
                    format!("hook '{label}' anchorStart and anchorEnd must differ"),
                    format!("{base}.location"),
                ));
            }
        }

        if let Some(file) = file {
            if let Some((zone_path, _)) = overwrite_matchers
                .iter()
                .find(|(_, matcher)| matcher.is_match(file))
            {
                findings.push(
                    hard(
                        ErrorCode::HookInOverwrite,
                        format!(
                            "hook '{label}' file '{file}' falls inside overwrite zone '{zone_path}'"
                        ),
                        format!("{base}.location.file"),
                    )
                    .with_suggestion("move the file into an anchored or preserve zone"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blueprint_model::parse_document;

    fn run(generation: &str) -> Vec<ValidationError> {
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
domain:
  nodes:
    - kind: System
      id: system.root
      spec: {{goals: [demo]}}
{generation}"#
        );
        check(&parse_document(&source).unwrap())
    }

    fn codes(findings: &[ValidationError]) -> Vec<ErrorCode> {
        findings.iter().map(|f| f.code).collect()
    }

    #[test]
    fn absent_generation_section_is_a_no_op() {
        assert!(run("").is_empty());
    }

    #[test]
    fn well_formed_zones_and_hooks_pass() {
        let findings = run(
            r#"generation:
  zones:
    - {path: "apps/api/**", mode: overwrite}
    - {path: "apps/web/**", mode: anchored}
  hooks:
    - id: hook.custom-routes
      location: {file: "apps/web/src/routes.rs", anchorStart: "// custom:start", anchorEnd: "// custom:end"}
"#,
        );
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn zone_missing_path_and_mode() {
        let findings = run(
            r#"generation:
  zones:
    - {}
"#,
        );
        assert_eq!(
            codes(&findings),
            vec![ErrorCode::InvalidZone, ErrorCode::InvalidZone]
        );
    }

    #[test]
    fn unknown_zone_mode_is_flagged() {
        let findings = run(
            r#"generation:
  zones:
    - {path: "apps/api/**", mode: replace}
"#,
        );
        assert_eq!(codes(&findings), vec![ErrorCode::InvalidZone]);
        assert!(findings[0].message.contains("replace"));
    }

    #[test]
    fn identical_zone_paths_reported_once() {
        let findings = run(
            r#"generation:
  zones:
    - {path: "apps/api/**", mode: overwrite}
    - {path: "apps/api/**", mode: preserve}
"#,
        );
        assert_eq!(codes(&findings), vec![ErrorCode::OverlappingZones]);
        assert_eq!(findings[0].location, "generation.zones[1].path");
    }

    #[test]
    fn nested_globs_are_not_treated_as_overlapping() {
        // String equality only; genuine glob-range intersection is out of scope.
        let findings = run(
            r#"generation:
  zones:
    - {path: "a/**", mode: preserve}
    - {path: "a/b/**", mode: preserve}
"#,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn hook_without_id_is_flagged() {
        let findings = run(
            r#"generation:
  hooks:
    - location: {file: "src/api.rs", anchorStart: "// a", anchorEnd: "// b"}
"#,
        );
        assert_eq!(codes(&findings), vec![ErrorCode::MissingHookId]);
    }

    #[test]
    fn duplicate_hook_ids_are_flagged() {
        let findings = run(
            r#"generation:
  hooks:
    - id: hook.routes
      location: {file: "src/a.rs", anchorStart: "// a", anchorEnd: "// b"}
    - id: hook.routes
      location: {file: "src/b.rs", anchorStart: "// a", anchorEnd: "// b"}
"#,
        );
        assert_eq!(codes(&findings), vec![ErrorCode::DuplicateHookId]);
        assert_eq!(findings[0].location, "generation.hooks[1].id");
    }

    #[test]
    fn hook_location_must_be_complete() {
        let findings = run(
            r#"generation:
  hooks:
    - id: hook.routes
      location: {file: "src/a.rs"}
"#,
        );
        assert_eq!(
            codes(&findings),
            vec![
                ErrorCode::InvalidHookLocation,
                ErrorCode::InvalidHookLocation
            ]
        );
        assert_eq!(findings[0].location, "generation.hooks[0].location.anchorStart");
        assert_eq!(findings[1].location, "generation.hooks[0].location.anchorEnd");
    }

    #[test]
    fn hook_anchors_must_differ() {
        let findings = run(
            r#"generation:
  hooks:
    - id: hook.routes
      location: {file: "src/a.rs", anchorStart: "// same", anchorEnd: "// same"}
"#,
        );
        assert_eq!(codes(&findings), vec![ErrorCode::InvalidHookLocation]);
        assert!(findings[0].message.contains("must differ"));
    }

    #[test]
    fn hook_missing_location_entirely() {
        let findings = run(
            r#"generation:
  hooks:
    - id: hook.routes
"#,
        );
        assert_eq!(codes(&findings), vec![ErrorCode::InvalidHookLocation]);
        assert_eq!(findings[0].location, "generation.hooks[0].location");
    }

    #[test]
    fn hook_in_overwrite_zone_is_flagged() {
        let findings = run(
            r#"generation:
  zones:
    - {path: "apps/api/**", mode: overwrite}
  hooks:
    - id: hook.handlers
      location: {file: "apps/api/src/handlers.rs", anchorStart: "// a", anchorEnd: "// b"}
"#,
        );
        assert_eq!(codes(&findings), vec![ErrorCode::HookInOverwrite]);
        assert!(findings[0].message.contains("apps/api/**"));
        assert_eq!(findings[0].location, "generation.hooks[0].location.file");
    }

    #[test]
    fn hook_in_non_overwrite_zone_passes() {
        let findings = run(
            r#"generation:
  zones:
    - {path: "apps/api/**", mode: anchored}
  hooks:
    - id: hook.handlers
      location: {file: "apps/api/src/handlers.rs", anchorStart: "// a", anchorEnd: "// b"}
"#,
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn single_star_does_not_cross_separators() {
        let findings = run(
            r#"generation:
  zones:
    - {path: "apps/*.rs", mode: overwrite}
  hooks:
    - id: hook.deep
      location: {file: "apps/api/deep.rs", anchorStart: "// a", anchorEnd: "// b"}
    - id: hook.shallow
      location: {file: "apps/top.rs", anchorStart: "// a", anchorEnd: "// b"}
"#,
        );
        assert_eq!(codes(&findings), vec![ErrorCode::HookInOverwrite]);
        assert!(findings[0].message.contains("hook.shallow"));
    }
}
