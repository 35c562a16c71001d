// src/lib.rs

//! Addressing for macOS accessibility trees: element paths, menu paths, opaque element ids,
//! per-application menu caches, and snapshot change detection.

pub mod addressing;
/// Command-line front end over JSON snapshots.
pub mod cli;
/// Shared constants and defaults.
pub mod constants;
/// Path grammar, resolution, caches and diffing.
pub mod core;
/// Accessibility tree and menu data structures.
pub mod models;

pub use addressing::{Addressing, AddressingError};
pub use core::element_path::{ElementPath, ElementPathError, PathSegment};
pub use core::path_resolver::{PathResolver, ResolutionOutcome, resolve};
pub use models::{MenuHierarchy, MenuItem, UiElement};
