// src/cli/handlers/resolve.rs

use crate::addressing::Addressing;
use crate::cli::handlers::commons;
use crate::core::path_resolver::ResolutionOutcome;
use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    about = "Resolves an element path against a snapshot."
)]
struct ResolveArgs {
    /// JSON snapshot to resolve against.
    snapshot: PathBuf,

    /// The element path, e.g. 'macos://ui/AXApplication[@AXTitle="Notes"]/AXWindow'.
    path: String,

    /// Print a per-segment trace when resolution fails.
    #[arg(long, short)]
    diagnose: bool,

    /// Also print the opaque id of the resolved element.
    #[arg(long)]
    token: bool,
}

/// Parses `resolve` arguments and prints the resolved element.
pub fn handle(args: Vec<String>, service: &Addressing) -> Result<()> {
    let resolve_args = ResolveArgs::try_parse_from(&args)?;
    let tree = commons::load_snapshot(service, &resolve_args.snapshot)?;

    match service.resolve(&resolve_args.path, &tree) {
        ResolutionOutcome::Resolved { element, warnings } => {
            println!("\n{}", "Resolved".green().bold());
            commons::print_element(element);
            if resolve_args.token {
                println!("  {:<13} {}", "id".blue(), service.opaque_encode(&element.path));
            }
            for warning in &warnings {
                println!("  {} {}", "warning:".yellow(), warning);
            }
            Ok(())
        }
        ResolutionOutcome::Ambiguous {
            segment_index,
            count,
            suggestions,
        } => {
            println!(
                "\n{} segment {} matches {} elements. Try one of:",
                "Ambiguous:".yellow().bold(),
                segment_index,
                count
            );
            for suggestion in &suggestions {
                println!("  {}", suggestion.cyan());
            }
            bail!("Path '{}' is ambiguous.", resolve_args.path)
        }
        ResolutionOutcome::NotFound {
            segment_index,
            reason,
        } => {
            println!("\n{} {}", "Not found:".red().bold(), reason);
            if resolve_args.diagnose {
                print_diagnosis(service, &resolve_args.path, &tree)?;
            }
            bail!(
                "Path '{}' does not resolve (failed at segment {}).",
                resolve_args.path,
                segment_index
            )
        }
        ResolutionOutcome::Error(err) => Err(err.into()),
    }
}

fn print_diagnosis(
    service: &Addressing,
    path: &str,
    tree: &crate::models::UiElement,
) -> Result<()> {
    let diagnosis = service.diagnose(path, tree)?;
    println!("\n--- {} ---", "Diagnosis".yellow());
    for step in &diagnosis.steps {
        let marker = if step.matches == 0 {
            "✗".red()
        } else {
            "✓".green()
        };
        println!(
            "  {} [{}] {} ({} of {} candidates)",
            marker, step.index, step.segment, step.matches, step.candidates
        );
        for near in &step.near_misses {
            println!("      {} {}", "near:".dimmed(), near);
        }
    }
    Ok(())
}
