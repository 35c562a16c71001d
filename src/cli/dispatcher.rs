// src/cli/dispatcher.rs

use crate::addressing::Addressing;
use crate::cli::handlers;
use anyhow::{Result, anyhow};

/// A command, its aliases, and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &Addressing) -> Result<()>,
}

static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "resolve",
        aliases: &["res"],
        handler: handlers::resolve::handle,
    },
    CommandDefinition {
        name: "paths",
        aliases: &["ls"],
        handler: handlers::paths::handle,
    },
    CommandDefinition {
        name: "menu",
        aliases: &[],
        handler: handlers::menu::handle,
    },
    CommandDefinition {
        name: "diff",
        aliases: &[],
        handler: handlers::diff::handle,
    },
];

/// Finds a command definition in the registry by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|cmd| cmd.name == name || cmd.aliases.contains(&name))
}

/// Names of every registered command, for help and error messages.
pub fn command_names() -> Vec<&'static str> {
    COMMAND_REGISTRY.iter().map(|cmd| cmd.name).collect()
}

/// Routes `command` and its arguments to the matching handler.
pub fn dispatch(command: &str, args: Vec<String>, service: &Addressing) -> Result<()> {
    log::debug!("Dispatching '{}' with args: {:?}", command, args);
    let definition = find_command(command).ok_or_else(|| {
        anyhow!(
            "Unknown command '{}'. Available commands: {}.",
            command,
            command_names().join(", ")
        )
    })?;
    (definition.handler)(args, service)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_command_by_name_and_alias() {
        assert_eq!(find_command("resolve").map(|c| c.name), Some("resolve"));
        assert_eq!(find_command("ls").map(|c| c.name), Some("paths"));
        assert!(find_command("run").is_none());
    }

    #[test]
    fn test_unknown_command_lists_available_ones() {
        let err = dispatch("explode", vec![], &Addressing::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("explode"));
        assert!(message.contains("resolve, paths, menu, diff"));
    }
}
