// src/cli/handlers/menu.rs

use crate::addressing::Addressing;
use crate::cli::handlers::commons;
use crate::core::menu_path::{self, MenuResolution};
use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    no_binary_name = true,
    about = "Looks a menu path up in a captured menu bar."
)]
struct MenuArgs {
    /// JSON file with `application_id` and `menus`.
    menus: PathBuf,

    /// Menu path, e.g. 'File > Save As…'.
    path: String,

    /// Maximum number of partial matches or suggestions to print.
    #[arg(long, short)]
    limit: Option<usize>,
}

/// Parses `menu` arguments and looks the menu path up.
pub fn handle(args: Vec<String>, service: &Addressing) -> Result<()> {
    let menu_args = MenuArgs::try_parse_from(&args)?;
    let hierarchy = commons::load_menus(service, &menu_args.menus)?;

    let resolution = match menu_args.limit {
        Some(limit) => menu_path::resolve_menu_path(&menu_args.path, &hierarchy, limit)?,
        None => service.resolve_menu_path(&hierarchy.application_id, &menu_args.path)?,
    };

    match resolution {
        MenuResolution::Exact(path) => {
            println!("{} {}", "Found:".green().bold(), path);
            if let Some(element) = hierarchy.element_path_for(&path) {
                println!("  {:<8} {}", "element".blue(), element);
            }
        }
        MenuResolution::Partial(paths) => {
            println!("{}", "Partial matches:".yellow().bold());
            for path in paths {
                println!("  {}", path);
            }
        }
        MenuResolution::Suggestions(paths) => {
            println!(
                "{} '{}' not found. Did you mean:",
                "Menu path".yellow().bold(),
                menu_args.path
            );
            for path in paths {
                println!("  {}", path.cyan());
            }
        }
    }
    Ok(())
}
