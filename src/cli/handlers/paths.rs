// src/cli/handlers/paths.rs

use crate::addressing::Addressing;
use crate::cli::handlers::commons;
use crate::constants::SYSTEM_WIDE_ROLE;
use crate::models::UiElement;
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    about = "Prints the generated path of every element in a snapshot."
)]
struct PathsArgs {
    /// JSON snapshot to walk.
    snapshot: PathBuf,

    /// Only print elements up to this depth below the top level.
    #[arg(long, short)]
    depth: Option<usize>,

    /// Print opaque ids next to the paths.
    #[arg(long)]
    tokens: bool,
}

/// Parses `paths` arguments and lists generated element paths.
pub fn handle(args: Vec<String>, service: &Addressing) -> Result<()> {
    let paths_args = PathsArgs::try_parse_from(&args)?;
    let tree = commons::load_snapshot(service, &paths_args.snapshot)?;

    let mut count = 0;
    let mut print = |element: &UiElement| {
        count += 1;
        if paths_args.tokens {
            println!("{}  {}", service.opaque_encode(&element.path).dimmed(), element.path);
        } else {
            println!("{}", element.path);
        }
    };

    if tree.role == SYSTEM_WIDE_ROLE {
        for child in &tree.children {
            walk(child, 0, paths_args.depth, &mut print);
        }
    } else {
        walk(&tree, 0, paths_args.depth, &mut print);
    }

    log::debug!("Printed {} element path(s).", count);
    Ok(())
}

fn walk(
    element: &UiElement,
    depth: usize,
    max_depth: Option<usize>,
    visit: &mut impl FnMut(&UiElement),
) {
    visit(element);
    if max_depth.is_some_and(|max| depth >= max) {
        return;
    }
    for child in &element.children {
        walk(child, depth + 1, max_depth, visit);
    }
}
