// src/core/tree_source.rs

//! # Tree Sources
//!
//! The boundary to whatever actually talks to the accessibility surface. A [`TreeSource`]
//! produces a complete, path-annotated tree for a scope; everything downstream (resolution,
//! flattening, diffing) works on that owned snapshot.
//!
//! [`JsonSnapshotSource`] serves snapshots previously captured to disk as JSON.

use crate::constants::SYSTEM_WIDE_ROLE;
use crate::core::element_path::ElementPathError;
use crate::core::path_generator::generate_paths;
use crate::models::UiElement;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

const APPLICATION_ROLE: &str = "AXApplication";

/// Part of the accessibility surface a snapshot covers.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotScope {
    /// Every application, under an `AXSystemWide` root.
    SystemWide,
    /// One application, by title or bundle identifier.
    Application(String),
    /// The deepest element under a screen point, with its subtree.
    Position {
        /// Horizontal screen coordinate.
        x: f64,
        /// Vertical screen coordinate.
        y: f64,
    },
}

impl fmt::Display for SnapshotScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SystemWide => write!(f, "system-wide"),
            Self::Application(app) => write!(f, "application '{}'", app),
            Self::Position { x, y } => write!(f, "position ({}, {})", x, y),
        }
    }
}

/// Failures of a [`TreeSource`].
#[derive(Error, Debug)]
pub enum SourceError {
    /// The process may not read the accessibility surface or the snapshot.
    #[error("Accessibility access denied for '{0}'.")]
    PermissionDenied(String),
    /// The snapshot file could not be read.
    #[error("Could not read snapshot '{path}': {source}")]
    Io {
        /// Snapshot file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The snapshot file is not a serialized element tree.
    #[error("Could not parse snapshot '{path}': {source}")]
    Json {
        /// Snapshot file.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// The scope names an application or point the tree does not contain.
    #[error("Nothing in the snapshot matches {0}.")]
    ScopeNotFound(SnapshotScope),
}

impl SourceError {
    /// The resolver-facing error for this failure, if it is an environment problem.
    pub fn as_path_error(&self) -> Option<ElementPathError> {
        match self {
            Self::PermissionDenied(target) => {
                Some(ElementPathError::InsufficientPermissions(target.clone()))
            }
            _ => None,
        }
    }
}

/// Produces owned, path-annotated trees for a scope.
pub trait TreeSource {
    /// Returns the tree for `scope`, cut off below `max_depth` levels (the root is level 0).
    fn snapshot(&self, scope: &SnapshotScope, max_depth: usize) -> Result<UiElement, SourceError>;
}

/// Serves snapshots from a JSON file holding one serialized [`UiElement`] tree.
#[derive(Debug, Clone)]
pub struct JsonSnapshotSource {
    path: PathBuf,
}

impl JsonSnapshotSource {
    /// Source reading `path` on every snapshot.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The snapshot file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the whole file, without scoping or path generation.
    pub fn read_tree(&self) -> Result<UiElement, SourceError> {
        let display = self.path.display().to_string();
        let content = fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                SourceError::PermissionDenied(display.clone())
            } else {
                SourceError::Io {
                    path: display.clone(),
                    source: e,
                }
            }
        })?;
        let mut tree: UiElement =
            serde_json::from_str(&content).map_err(|e| SourceError::Json {
                path: display,
                source: e,
            })?;
        tree.normalize_attributes();
        Ok(tree)
    }
}

impl TreeSource for JsonSnapshotSource {
    fn snapshot(&self, scope: &SnapshotScope, max_depth: usize) -> Result<UiElement, SourceError> {
        let tree = self.read_tree()?;
        let mut scoped = select_scope(tree, scope)?;
        truncate(&mut scoped, max_depth);
        generate_paths(&mut scoped);
        log::debug!(
            "Snapshot of {} from '{}': {} element(s).",
            scope,
            self.path.display(),
            scoped.subtree_len()
        );
        Ok(scoped)
    }
}

/// Narrows a full tree down to `scope`.
pub fn select_scope(tree: UiElement, scope: &SnapshotScope) -> Result<UiElement, SourceError> {
    match scope {
        SnapshotScope::SystemWide => Ok(tree),
        SnapshotScope::Application(app) => {
            let is_app = |e: &UiElement| {
                e.role == APPLICATION_ROLE
                    && (e.title.as_deref() == Some(app.as_str())
                        || e.identifier.as_deref() == Some(app.as_str()))
            };
            if is_app(&tree) {
                return Ok(tree);
            }
            if tree.role == SYSTEM_WIDE_ROLE {
                if let Some(found) = tree.children.into_iter().find(|c| is_app(c)) {
                    return Ok(found);
                }
            }
            Err(SourceError::ScopeNotFound(scope.clone()))
        }
        SnapshotScope::Position { x, y } => {
            deepest_at(&tree, *x, *y)
                .cloned()
                .ok_or_else(|| SourceError::ScopeNotFound(scope.clone()))
        }
    }
}

fn deepest_at(element: &UiElement, x: f64, y: f64) -> Option<&UiElement> {
    // The system-wide root has no frame of its own.
    let inside = element.role == SYSTEM_WIDE_ROLE || element.frame.contains(x, y);
    if !inside {
        return None;
    }
    element
        .children
        .iter()
        .rev()
        .find_map(|child| deepest_at(child, x, y))
        .or_else(|| (element.role != SYSTEM_WIDE_ROLE).then_some(element))
}

/// Drops every element deeper than `max_depth` below `root`.
pub fn truncate(root: &mut UiElement, max_depth: usize) {
    if max_depth == 0 {
        root.children.clear();
        return;
    }
    for child in &mut root.children {
        truncate(child, max_depth - 1);
    }
}
