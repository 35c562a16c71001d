// src/cli/handlers/commons.rs

// Shared helpers for the command handlers.

use crate::addressing::Addressing;
use crate::constants::DEFAULT_HIERARCHY_TTL_SECS;
use crate::core::tree_source::{JsonSnapshotSource, SnapshotScope};
use crate::models::{MenuHierarchy, MenuItem, UiElement};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Loads the full system-wide tree of a snapshot file, with paths generated.
pub fn load_snapshot(service: &Addressing, path: &Path) -> Result<UiElement> {
    let source = JsonSnapshotSource::new(path);
    service
        .snapshot(&source, &SnapshotScope::SystemWide)
        .with_context(|| format!("Failed to load snapshot '{}'", path.display()))
}

/// On-disk form of a captured menu bar.
#[derive(Deserialize, Debug)]
struct MenuFile {
    application_id: String,
    menus: Vec<MenuItem>,
}

/// Reads a menu file and returns its hierarchy, going through the service's cache.
pub fn load_menus(service: &Addressing, path: &Path) -> Result<Arc<MenuHierarchy>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read menu file '{}'", path.display()))?;
    let file: MenuFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse menu file '{}'", path.display()))?;

    let ttl = Duration::from_secs(DEFAULT_HIERARCHY_TTL_SECS);
    let application_id = file.application_id.clone();
    service.menu_hierarchy_or_fetch(&application_id, || {
        Ok(MenuHierarchy::new(file.application_id, file.menus, ttl))
    })
}

/// Prints an element with its main properties, one per line.
pub fn print_element(element: &UiElement) {
    println!("  {:<13} {}", "path".blue(), element.path);
    println!("  {:<13} {}", "role".blue(), element.role);
    for (label, value) in [
        ("identifier", &element.identifier),
        ("title", &element.title),
        ("description", &element.description),
        ("value", &element.value),
    ] {
        if let Some(value) = value {
            println!("  {:<13} {}", label.blue(), value);
        }
    }
    if !element.actions.is_empty() {
        let actions: Vec<&str> = element.actions.iter().map(String::as_str).collect();
        println!("  {:<13} {}", "actions".blue(), actions.join(", "));
    }
    if !element.children.is_empty() {
        println!("  {:<13} {}", "children".blue(), element.children.len());
    }
}
