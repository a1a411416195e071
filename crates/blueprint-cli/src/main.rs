//! CLI binary for validating and inspecting Blueprint spec documents.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use blueprint_model::NodeKind;
use blueprint_types::{Level, Phase};
use blueprint_validate::{Validator, ValidatorOptions};

#[derive(Parser)]
#[command(name = "blu", version, about = "Validator for Blueprint spec documents")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a blueprint document
    Validate {
        /// Path to the blueprint file (YAML or JSON)
        file: PathBuf,

        /// Treat soft findings as blocking
        #[arg(long)]
        strict: bool,

        /// Comma-separated phase numbers to run (default: all six), e.g. 1,2,3
        #[arg(long, value_delimiter = ',')]
        phases: Option<Vec<u8>>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show information about a blueprint document
    Info {
        /// Path to the blueprint file (YAML or JSON)
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Validate {
            file,
            strict,
            phases,
            json,
        } => cmd_validate(&file, strict, phases.as_deref(), json),
        Commands::Info { file } => cmd_info(&file),
    }
}

fn build_options(strict: bool, phases: Option<&[u8]>) -> anyhow::Result<ValidatorOptions> {
    let mut options = ValidatorOptions {
        strict,
        ..ValidatorOptions::default()
    };
    if let Some(numbers) = phases {
        let mut selected = Vec::new();
        for number in numbers {
            let phase = Phase::try_from(*number).map_err(|err| anyhow::anyhow!(err))?;
            if !selected.contains(&phase) {
                selected.push(phase);
            }
        }
        options.phases = selected;
    }
    Ok(options)
}

fn cmd_validate(
    path: &Path,
    strict: bool,
    phases: Option<&[u8]>,
    json: bool,
) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path)?;
    let options = build_options(strict, phases)?;
    let result = Validator::with_options(options).validate_source(&source);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.ok && result.warnings.is_empty() {
        println!("Document is valid");
    } else {
        for finding in result.errors.iter().chain(&result.warnings) {
            let level = match finding.level {
                Level::Hard => "HARD",
                Level::Soft => "SOFT",
            };
            if finding.location.is_empty() {
                println!("[{level}] {}: {}", finding.code, finding.message);
            } else {
                println!(
                    "[{level}] {}: {} ({})",
                    finding.code, finding.message, finding.location
                );
            }
            if let Some(suggestion) = &finding.suggestion {
                println!("        hint: {suggestion}");
            }
        }
        if result.ok {
            println!("Document is valid with warnings");
        } else {
            println!("Validation stopped at {}", result.phase);
        }
    }

    if !result.ok {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_info(path: &Path) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(path)?;
    let doc = blueprint_model::parse_document(&source)?;

    println!("Project: {}", doc.project.id);
    println!(
        "Version: {} ({})",
        doc.project.versioning.current, doc.project.versioning.strategy
    );
    println!("Root: {}", blueprint_model::ref_target(&doc.structure.root));
    println!("Nodes: {}", doc.domain.nodes.len());
    for kind in NodeKind::ALL {
        let count = doc.domain.nodes.iter().filter(|n| n.kind == kind).count();
        if count > 0 {
            println!("  {kind}: {count}");
        }
    }

    if !doc.history.is_empty() {
        println!(
            "History: {} entries, current '{}'",
            doc.history.len(),
            doc.project.versioning.current
        );
    }
    if let Some(generation) = &doc.generation {
        println!(
            "Generation: {} zones, {} hooks, pipelines {}",
            generation.zones.len(),
            generation.hooks.len(),
            if generation.pipelines.is_some() {
                "declared"
            } else {
                "absent"
            }
        );
    }
    if let Some(tests) = &doc.tests {
        println!("Scenarios referenced: {}", tests.scenarios.len());
    }

    Ok(())
}
