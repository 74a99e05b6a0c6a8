//! rcsfix: generate, normalize and round-trip check RCS fixture files.

mod commands;
mod logging;
mod manifest;

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};

use manifest::FixtureManifest;

#[derive(Parser)]
#[command(name = "rcsfix", version, about = "RCS fixture tooling")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the fixtures described by rcsfix.toml and write them out
    Generate {
        /// Manifest path (default: search upward for rcsfix.toml)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Only generate the named fixture files
        #[arg(long)]
        only: Vec<String>,
        /// Output directory (default: the manifest's output_dir)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Parse and re-serialize files, reporting any byte difference
    Roundtrip {
        /// Files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Rewrite a file in canonical form
    Normalize {
        /// File to normalize
        file: PathBuf,
        /// Overwrite the file instead of printing to stdout
        #[arg(long)]
        in_place: bool,
    },
    /// Show a file's header and revisions
    Inspect {
        /// File to inspect
        file: PathBuf,
        /// Output format (text, json)
        #[arg(long)]
        export: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose) {
        eprintln!("error: failed to initialize logging: {e:#}");
        process::exit(1);
    }

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            manifest,
            only,
            output,
        } => {
            let (manifest, base_dir) = load_manifest(manifest)?;
            commands::generate::run(&manifest, &base_dir, &only, output.as_deref())?;
            Ok(())
        }
        Commands::Roundtrip { files } => commands::roundtrip::run(&files),
        Commands::Normalize { file, in_place } => commands::normalize::run(&file, in_place),
        Commands::Inspect { file, export } => commands::inspect::run(&file, export.as_deref()),
    }
}

/// Load an explicit manifest, or search upward from the working directory.
/// Returns the manifest and the directory relative paths resolve against.
fn load_manifest(path: Option<PathBuf>) -> anyhow::Result<(FixtureManifest, PathBuf)> {
    match path {
        Some(path) => {
            let manifest = FixtureManifest::load(&path)?;
            let base = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            Ok((manifest, base))
        }
        None => {
            let cwd = std::env::current_dir().context("reading working directory")?;
            FixtureManifest::find_and_load(&cwd)?.with_context(|| {
                format!(
                    "no {} found in {} or any parent directory",
                    manifest::MANIFEST_FILE,
                    cwd.display()
                )
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const MANIFEST: &str = r#"
output_dir = "generated"

[[fixture]]
file = "branches.v"
head = "1.2"
description = "File with branches"

[[fixture.revision]]
id = "1.2"
date = "2023.01.01.00.00.00"
author = "user"
next = "1.1"
branches = ["1.2.1.1"]
log = "Second revision"
text = "Line 1\nLine 2\n"

[[fixture.revision]]
id = "1.1"
date = "2022.01.01.00.00.00"
author = "user"
log = "Initial revision"
text = "Line 1\n"

[[fixture.revision]]
id = "1.2.1.1"
date = "2023.02.01.00.00.00"
author = "user"
log = "Branch revision"
text = "Line 1\nLine 2\nBranch Line\n"
"#;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_verbosity_anywhere() {
        let cli = Cli::try_parse_from(["rcsfix", "roundtrip", "-vv", "a.v"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    /// Generate, roundtrip, normalize and inspect one fixture.
    #[test]
    fn generate_then_round_trip_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join(manifest::MANIFEST_FILE);
        std::fs::write(&manifest_path, MANIFEST).unwrap();

        run(Cli::try_parse_from([
            "rcsfix",
            "generate",
            "--manifest",
            manifest_path.to_str().unwrap(),
        ])
        .unwrap())
        .unwrap();

        let generated = dir.path().join("generated/branches.v");
        let text = std::fs::read_to_string(&generated).unwrap();
        let ids: Vec<&str> = text.lines().filter(|l| l.starts_with("1.")).collect();
        assert_eq!(ids, ["1.2", "1.2.1.1", "1.1", "1.2", "1.2.1.1", "1.1"]);

        commands::roundtrip::run(&[generated.clone()]).unwrap();
        commands::normalize::run(&generated, true).unwrap();
        assert_eq!(std::fs::read_to_string(&generated).unwrap(), text);
        commands::inspect::run(&generated, None).unwrap();
    }

    #[test]
    fn explicit_manifest_resolves_relative_to_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("fixtures.toml");
        std::fs::write(&manifest_path, MANIFEST).unwrap();

        let (manifest, base) = load_manifest(Some(manifest_path)).unwrap();
        assert_eq!(base, dir.path());
        assert_eq!(manifest.fixtures.len(), 1);
    }
}
