// src/cli/handlers/mod.rs

// One module per CLI command.

/// Snapshot and menu loading shared by the handlers.
pub mod commons;
/// `axpath diff`
pub mod diff;
/// `axpath menu`
pub mod menu;
/// `axpath paths`
pub mod paths;
/// `axpath resolve`
pub mod resolve;
