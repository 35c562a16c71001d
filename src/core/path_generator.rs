// src/core/path_generator.rs

//! Assigns element paths to every node of a freshly fetched snapshot and flattens it into
//! the path → element map consumed by the change detector.
//!
//! A generated segment carries the element's role and every identifying attribute it exposes
//! (identifier, title, description). An `#index` is appended only when siblings are still
//! indistinguishable, so each generated path resolves back to the element it was built for.

use crate::constants::{ELEMENT_PATH_PREFIX, SYSTEM_WIDE_ROLE};
use crate::core::attributes;
use crate::core::element_path::{ElementPath, PathSegment};
use crate::core::path_resolver::segment_matches;
use crate::models::UiElement;
use std::collections::HashMap;

/// Path → element map of one snapshot. Every element holds its full subtree.
pub type Snapshot = HashMap<String, UiElement>;

/// Fills `path` and `parent_path` of every element below (and including) `root`.
pub fn generate_paths(root: &mut UiElement) {
    if root.role == SYSTEM_WIDE_ROLE {
        // The system-wide root is implicit in paths: resolution starts at its children.
        root.path = format!("{}{}", ELEMENT_PATH_PREFIX, SYSTEM_WIDE_ROLE);
        root.parent_path = None;
        let segments = sibling_segments(&root.children);
        for (child, segment) in root.children.iter_mut().zip(segments) {
            let path = ElementPath::from_segments(vec![segment]);
            if let Ok(path) = path {
                assign(child, path, None);
            }
        }
        return;
    }

    let segment = identifying_segment(root);
    if let Ok(path) = ElementPath::from_segments(vec![segment]) {
        assign(root, path, None);
    }
}

fn assign(element: &mut UiElement, path: ElementPath, parent: Option<String>) {
    element.path = path.to_string();
    element.parent_path = parent;

    let segments = sibling_segments(&element.children);
    let own_path = element.path.clone();
    for (child, segment) in element.children.iter_mut().zip(segments) {
        assign(child, path.child(segment), Some(own_path.clone()));
    }
}

/// One segment per sibling, each matching only its own element among `siblings`.
fn sibling_segments(siblings: &[UiElement]) -> Vec<PathSegment> {
    siblings
        .iter()
        .enumerate()
        .map(|(position, element)| {
            let segment = identifying_segment(element);
            let matching: Vec<usize> = siblings
                .iter()
                .enumerate()
                .filter(|(_, other)| segment_matches(&segment, other))
                .map(|(i, _)| i)
                .collect();
            if matching.len() > 1 {
                let index = matching.iter().position(|&i| i == position).unwrap_or(0);
                segment.with_index(index)
            } else {
                segment
            }
        })
        .collect()
}

fn identifying_segment(element: &UiElement) -> PathSegment {
    attributes::IDENTIFYING
        .iter()
        .fold(PathSegment::new(element.role.clone()), |segment, name| {
            match element.attribute_text(name) {
                Some(value) => segment.with_predicate(name, value.into_owned()),
                None => segment,
            }
        })
}

/// Flattens a tree whose paths were generated into a path → element map.
/// A system-wide root is not an addressable element and is left out.
pub fn flatten(root: &UiElement) -> Snapshot {
    let mut snapshot = Snapshot::new();
    if root.role == SYSTEM_WIDE_ROLE {
        for child in &root.children {
            collect(child, &mut snapshot);
        }
    } else {
        collect(root, &mut snapshot);
    }
    snapshot
}

fn collect(element: &UiElement, snapshot: &mut Snapshot) {
    snapshot.insert(element.path.clone(), element.clone());
    for child in &element.children {
        collect(child, snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::path_resolver::PathResolver;

    fn window() -> UiElement {
        UiElement::new("AXApplication").with_title("TextEdit").with_child(
            UiElement::new("AXWindow").with_title("Untitled").with_children([
                UiElement::new("AXButton").with_description("close"),
                UiElement::new("AXButton"),
                UiElement::new("AXButton"),
                UiElement::new("AXTextArea").with_identifier("body").with_value("hello"),
            ]),
        )
    }

    #[test]
    fn test_generate_paths_builds_identifying_segments() {
        let mut tree = window();
        generate_paths(&mut tree);

        assert_eq!(tree.path, r#"macos://ui/AXApplication[@AXTitle="TextEdit"]"#);
        let win = &tree.children[0];
        assert_eq!(win.parent_path.as_deref(), Some(tree.path.as_str()));
        assert_eq!(
            win.children[0].path,
            r#"macos://ui/AXApplication[@AXTitle="TextEdit"]/AXWindow[@AXTitle="Untitled"]/AXButton[@AXDescription="close"]"#
        );
        // Plain buttons match the labeled one too, so they are told apart by index.
        assert!(win.children[1].path.ends_with("/AXButton#1"));
        assert!(win.children[2].path.ends_with("/AXButton#2"));
        assert!(win.children[3].path.ends_with(r#"/AXTextArea[@AXIdentifier="body"]"#));
    }

    #[test]
    fn test_generated_paths_resolve_back() {
        let mut tree = window();
        generate_paths(&mut tree);
        let snapshot = flatten(&tree);
        assert_eq!(snapshot.len(), tree.subtree_len());

        let resolver = PathResolver::default();
        for (path, element) in &snapshot {
            let resolution = resolver.resolve_str(path, &tree).unwrap();
            assert_eq!(&resolution.element.path, path);
            assert_eq!(resolution.element.role, element.role);
        }
    }

    #[test]
    fn test_system_wide_root_is_not_flattened() {
        let mut tree = UiElement::new(SYSTEM_WIDE_ROLE).with_children([
            UiElement::new("AXApplication").with_title("Finder"),
            UiElement::new("AXApplication").with_title("Mail"),
        ]);
        generate_paths(&mut tree);
        let snapshot = flatten(&tree);

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains_key(r#"macos://ui/AXApplication[@AXTitle="Mail"]"#));
        let resolver = PathResolver::default();
        for path in snapshot.keys() {
            assert!(resolver.resolve_str(path, &tree).is_ok());
        }
    }
}
