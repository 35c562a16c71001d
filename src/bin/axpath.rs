// src/bin/axpath.rs

//! Command-line entry point for `axpath`.

use anyhow::{Context, Result};
use axpath::{
    addressing::Addressing,
    cli::{Cli, dispatcher},
    core::settings::Settings,
};
use clap::Parser;
use colored::*;

/// The main entry point of the `axpath` application.
/// It sets up logging, parses arguments, dispatches to the correct handler,
/// and performs centralized error handling.
fn main() {
    env_logger::init();

    if let Err(e) = run_cli(Cli::parse()) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    log::debug!("CLI args parsed: {:?}", cli);

    let settings = match &cli.config {
        Some(path) => Settings::load(path),
        None => Settings::load_default(),
    }
    .context("Failed to load settings")?;

    let Some(command) = cli.command else {
        println!(
            "Usage: axpath <command> [args...]\nCommands: {}",
            dispatcher::command_names().join(", ")
        );
        return Ok(());
    };

    let service = Addressing::new(&settings);
    dispatcher::dispatch(&command, cli.args, &service)
}
