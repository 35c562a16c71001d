// src/core/change_detector.rs

//! # Change Detection
//!
//! Compares two flattened snapshots of the same scope and reports what appeared, what went
//! away, and which subtrees changed in between.
//!
//! Only snapshot roots are compared directly; a root is an element whose path has no other
//! key of the same map as a prefix ending at a segment separator. Changed roots are compared
//! child by child, by position.

use crate::constants::ELEMENT_PATH_SEPARATOR;
use crate::core::path_generator::Snapshot;
use crate::models::UiElement;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A root present in both snapshots whose subtree differs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModifiedElement {
    /// The root as it was.
    pub before: UiElement,
    /// The root as it is now.
    pub after: UiElement,
}

/// Differences between two snapshots.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ChangeSet {
    /// New roots (whole subtrees) and pruned copies of changed roots.
    pub new_elements: Vec<UiElement>,
    /// Paths of roots that disappeared.
    pub removed_paths: Vec<String>,
    /// Unpruned before/after pairs of changed roots.
    pub modified: Vec<ModifiedElement>,
}

impl ChangeSet {
    /// Whether anything appeared, disappeared or changed.
    pub fn has_changes(&self) -> bool {
        !self.new_elements.is_empty() || !self.removed_paths.is_empty() || !self.modified.is_empty()
    }
}

/// Computes the change set turning `before` into `after`.
pub fn diff(before: &Snapshot, after: &Snapshot) -> ChangeSet {
    let before_roots = roots(before);
    let after_roots = roots(after);
    let mut changes = ChangeSet::default();

    for (path, current) in &after_roots {
        match before_roots.get(path) {
            None => changes.new_elements.push((*current).clone()),
            Some(previous) => {
                if subtree_changed(previous, current) {
                    changes.new_elements.push(prune(previous, current));
                    changes.modified.push(ModifiedElement {
                        before: (*previous).clone(),
                        after: (*current).clone(),
                    });
                }
            }
        }
    }

    changes.removed_paths = before_roots
        .keys()
        .filter(|path| !after_roots.contains_key(*path))
        .map(|path| path.to_string())
        .collect();

    log::debug!(
        "Snapshot diff: {} new/changed, {} removed, {} modified.",
        changes.new_elements.len(),
        changes.removed_paths.len(),
        changes.modified.len()
    );
    changes
}

/// Roots of a snapshot keyed (and therefore sorted) by path.
fn roots(snapshot: &Snapshot) -> BTreeMap<&str, &UiElement> {
    snapshot
        .iter()
        .filter(|(path, _)| !has_ancestor_in(path, snapshot))
        .map(|(path, element)| (path.as_str(), element))
        .collect()
}

/// Whether some other key of `snapshot` is a prefix of `path` ending right before a separator.
fn has_ancestor_in(path: &str, snapshot: &Snapshot) -> bool {
    path.match_indices(ELEMENT_PATH_SEPARATOR)
        .filter_map(|(at, _)| path.get(..at))
        .any(|prefix| snapshot.contains_key(prefix))
}

/// Positional comparison of two subtrees.
fn subtree_changed(before: &UiElement, after: &UiElement) -> bool {
    !before.same_properties(after)
        || before.children.len() != after.children.len()
        || before
            .children
            .iter()
            .zip(&after.children)
            .any(|(b, a)| subtree_changed(b, a))
}

/// Copy of `after` keeping only changed children and children with no counterpart in `before`.
fn prune(before: &UiElement, after: &UiElement) -> UiElement {
    let mut copy = after.clone();
    copy.children = after
        .children
        .iter()
        .enumerate()
        .filter_map(|(position, child)| match before.children.get(position) {
            Some(previous) if subtree_changed(previous, child) => Some(prune(previous, child)),
            Some(_) => None,
            None => Some(child.clone()),
        })
        .map(|mut child| {
            child.parent_path = Some(copy.path.clone());
            child
        })
        .collect();
    copy
}
