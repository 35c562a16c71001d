// src/cli/handlers/diff.rs

use crate::addressing::Addressing;
use crate::cli::handlers::commons;
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    about = "Shows what changed between two snapshots."
)]
struct DiffArgs {
    before: PathBuf,
    after: PathBuf,

    /// Print the change set as JSON.
    #[arg(long)]
    json: bool,
}

/// Parses `diff` arguments and prints the change set between two snapshots.
pub fn handle(args: Vec<String>, service: &Addressing) -> Result<()> {
    let diff_args = DiffArgs::try_parse_from(&args)?;
    let before = commons::load_snapshot(service, &diff_args.before)?;
    let after = commons::load_snapshot(service, &diff_args.after)?;

    let changes = service.diff_trees(&before, &after);

    if diff_args.json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
        return Ok(());
    }

    if !changes.has_changes() {
        println!("{}", "No changes.".green());
        return Ok(());
    }

    for path in &changes.removed_paths {
        println!("{} {}", "-".red().bold(), path);
    }
    for modified in &changes.modified {
        println!("{} {}", "~".yellow().bold(), modified.after.path);
    }
    let modified_paths: Vec<&str> = changes.modified.iter().map(|m| m.after.path.as_str()).collect();
    for element in changes
        .new_elements
        .iter()
        .filter(|e| !modified_paths.contains(&e.path.as_str()))
    {
        println!("{} {}", "+".green().bold(), element.path);
    }
    Ok(())
}
