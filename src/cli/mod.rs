// src/cli/mod.rs

use clap::Parser;
use std::path::PathBuf;

/// Command registry and routing.
pub mod dispatcher;
/// One handler per command.
pub mod handlers;

/// axpath: resolve, generate, and diff macOS accessibility element paths.
///
/// Works on snapshots captured to JSON by an external tree fetcher.
///
/// Commands:
/// - `axpath resolve <snapshot.json> <path>`
/// - `axpath paths <snapshot.json> [--depth N]`
/// - `axpath menu <menu.json> <menu path> [--limit N]`
/// - `axpath diff <before.json> <after.json>`
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
#[command(
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
pub struct Cli {
    /// Settings file to use instead of the default location.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// The command to run.
    pub command: Option<String>,

    /// Arguments passed through to the command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
