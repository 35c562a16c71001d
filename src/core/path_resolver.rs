// src/core/path_resolver.rs

//! # Path Resolver
//!
//! Walks an [`ElementPath`] down a tree snapshot, one segment per level. At every level only
//! the direct children of the currently selected element are considered. Resolution never
//! guesses: a segment matching several children without an `#index` is an error carrying
//! ranked alternatives the caller can use to repair the path.

use crate::constants::{
    DEFAULT_MAX_RESOLUTION_DEPTH, DEFAULT_MAX_SUGGESTIONS, DEFAULT_MAX_VISITED_NODES,
    SYSTEM_WIDE_ROLE,
};
use crate::core::attributes;
use crate::core::element_path::{ElementPath, ElementPathError, PathSegment};
use crate::models::UiElement;
use std::fmt;
use std::time::{Duration, Instant};

/// Limits that stop resolution on pathological trees instead of looping indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionBudget {
    /// Maximum number of segments a path may have.
    pub max_depth: usize,
    /// Maximum number of elements inspected across all segments.
    pub max_visited_nodes: usize,
    /// Optional wall-clock limit for one resolution. A zero limit always times out.
    pub time_limit: Option<Duration>,
}

impl Default for ResolutionBudget {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
            max_visited_nodes: DEFAULT_MAX_VISITED_NODES,
            time_limit: None,
        }
    }
}

/// Advisory findings returned alongside a successful resolution. None of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathWarning {
    /// The segment carries an index although it matched a single element.
    UnnecessaryIndex {
        /// The segment as written.
        segment: String,
        /// Zero-based position of the segment.
        index: usize,
    },
    /// The segment matched one element, but siblings of the same role would make it
    /// ambiguous after a small change to the tree.
    PotentialAmbiguity {
        /// The segment as written.
        segment: String,
        /// Zero-based position of the segment.
        index: usize,
        /// Siblings sharing the element's role.
        similar: usize,
    },
    /// The segment has no predicates although the element exposes an identifying attribute.
    MissingAttribute {
        /// The segment as written.
        segment: String,
        /// Zero-based position of the segment.
        index: usize,
        /// Canonical name of the attribute that would pin the element.
        attribute: String,
    },
}

impl fmt::Display for PathWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnnecessaryIndex { segment, index } => write!(
                f,
                "Segment {} ('{}') matches a single element; its index can be removed.",
                index, segment
            ),
            Self::PotentialAmbiguity {
                segment,
                index,
                similar,
            } => write!(
                f,
                "Segment {} ('{}') has {} sibling(s) with the same role; consider an identifier predicate.",
                index, segment, similar
            ),
            Self::MissingAttribute {
                segment,
                index,
                attribute,
            } => write!(
                f,
                "Segment {} ('{}') could be pinned with [@{}=...].",
                index, segment, attribute
            ),
        }
    }
}

/// A successfully resolved element plus any advisory warnings.
#[derive(Debug, Clone)]
pub struct Resolution<'t> {
    /// The single element the path addresses.
    pub element: &'t UiElement,
    /// Advisory findings, in segment order.
    pub warnings: Vec<PathWarning>,
}

/// Outcome of a resolution as reported to the tool layer.
#[derive(Debug, Clone)]
pub enum ResolutionOutcome<'t> {
    /// Exactly one element was addressed.
    Resolved {
        /// The addressed element.
        element: &'t UiElement,
        /// Advisory findings.
        warnings: Vec<PathWarning>,
    },
    /// A segment without an index matched several elements.
    Ambiguous {
        /// Zero-based position of the ambiguous segment.
        segment_index: usize,
        /// How many elements matched.
        count: usize,
        /// Replacement segments, best first.
        suggestions: Vec<String>,
    },
    /// A segment matched nothing, or its index was out of range.
    NotFound {
        /// Zero-based position of the failing segment.
        segment_index: usize,
        /// Human-readable cause.
        reason: String,
    },
    /// Syntax and environment errors.
    Error(ElementPathError),
}

impl<'t> From<Result<Resolution<'t>, ElementPathError>> for ResolutionOutcome<'t> {
    fn from(result: Result<Resolution<'t>, ElementPathError>) -> Self {
        match result {
            Ok(Resolution { element, warnings }) => Self::Resolved { element, warnings },
            Err(ElementPathError::AmbiguousMatchNoIndex {
                index,
                count,
                alternatives,
                ..
            }) => Self::Ambiguous {
                segment_index: index,
                count,
                suggestions: alternatives,
            },
            Err(
                err @ (ElementPathError::NoMatchingElements { index, .. }
                | ElementPathError::IndexOutOfRange { index, .. }
                | ElementPathError::ResolutionFailed { index, .. }),
            ) => Self::NotFound {
                segment_index: index,
                reason: err.to_string(),
            },
            Err(err) => Self::Error(err),
        }
    }
}

/// Per-segment report produced by [`PathResolver::diagnose`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticStep {
    /// Zero-based position of the segment.
    pub index: usize,
    /// The segment as written.
    pub segment: String,
    /// Number of elements the segment was tested against.
    pub candidates: usize,
    /// Number of those that matched.
    pub matches: usize,
    /// Closest non-matching candidates, best first.
    pub near_misses: Vec<String>,
}

/// Full trace of a resolution attempt, for repairing failed paths.
#[derive(Debug, Clone)]
pub struct Diagnosis {
    /// One step per segment reached.
    pub steps: Vec<DiagnosticStep>,
    /// Why resolution stopped, if it did.
    pub error: Option<ElementPathError>,
}

impl Diagnosis {
    /// Whether the path resolved.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Resolves element paths against tree snapshots.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver {
    budget: ResolutionBudget,
    max_suggestions: usize,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(ResolutionBudget::default(), DEFAULT_MAX_SUGGESTIONS)
    }
}

/// Resolves `path_text` against `root` with default limits.
pub fn resolve<'t>(path_text: &str, root: &'t UiElement) -> ResolutionOutcome<'t> {
    PathResolver::default().resolve_str(path_text, root).into()
}

impl PathResolver {
    /// Creates a resolver. `max_suggestions` caps the alternatives of ambiguity errors.
    pub fn new(budget: ResolutionBudget, max_suggestions: usize) -> Self {
        Self {
            budget,
            max_suggestions,
        }
    }

    /// The limits this resolver applies.
    pub fn budget(&self) -> ResolutionBudget {
        self.budget
    }

    /// Parses and resolves in one step. Syntax errors are reported before any traversal.
    pub fn resolve_str<'t>(
        &self,
        path_text: &str,
        root: &'t UiElement,
    ) -> Result<Resolution<'t>, ElementPathError> {
        let path = ElementPath::parse(path_text)?;
        self.resolve(&path, root)
    }

    /// Resolves a parsed path to exactly one element of the tree rooted at `root`.
    pub fn resolve<'t>(
        &self,
        path: &ElementPath,
        root: &'t UiElement,
    ) -> Result<Resolution<'t>, ElementPathError> {
        self.walk(path, root, None)
    }

    /// Walks the path like [`resolve`](Self::resolve) but records what happened at every segment.
    pub fn diagnose(&self, path: &ElementPath, root: &UiElement) -> Diagnosis {
        let mut steps = Vec::new();
        let error = self.walk(path, root, Some(&mut steps)).err();
        Diagnosis { steps, error }
    }

    fn walk<'t>(
        &self,
        path: &ElementPath,
        root: &'t UiElement,
        mut steps: Option<&mut Vec<DiagnosticStep>>,
    ) -> Result<Resolution<'t>, ElementPathError> {
        if path.len() > self.budget.max_depth {
            log::warn!(
                "Path has {} segments, over the limit of {}.",
                path.len(),
                self.budget.max_depth
            );
            return Err(ElementPathError::ResolutionTimeout(format!(
                "path depth {} exceeds the maximum of {}",
                path.len(),
                self.budget.max_depth
            )));
        }

        let started = Instant::now();
        let mut visited = 0usize;
        let mut warnings = Vec::new();
        let mut current: Option<&'t UiElement> = None;

        for (index, segment) in path.segments().iter().enumerate() {
            let candidates: &'t [UiElement] = match current {
                Some(element) => &element.children,
                None if root.role == SYSTEM_WIDE_ROLE => &root.children,
                None => std::slice::from_ref(root),
            };

            visited += candidates.len();
            self.check_budget(visited, started)?;

            let matches: Vec<&'t UiElement> = candidates
                .iter()
                .filter(|candidate| segment_matches(segment, candidate))
                .collect();

            log::trace!(
                "Segment {} '{}': {} candidate(s), {} match(es).",
                index,
                segment,
                candidates.len(),
                matches.len()
            );

            if let Some(steps) = steps.as_deref_mut() {
                steps.push(DiagnosticStep {
                    index,
                    segment: segment.to_string(),
                    candidates: candidates.len(),
                    matches: matches.len(),
                    near_misses: self.near_misses(segment, candidates),
                });
            }

            let selected = match (matches.as_slice(), segment.index) {
                ([], _) => {
                    return Err(ElementPathError::NoMatchingElements {
                        segment: segment.to_string(),
                        index,
                    });
                }
                ([only], None) => {
                    warnings.extend(advisories(segment, index, only, candidates));
                    *only
                }
                (many, None) => {
                    log::debug!(
                        "Segment {} '{}' is ambiguous: {} matches.",
                        index,
                        segment,
                        many.len()
                    );
                    return Err(ElementPathError::AmbiguousMatchNoIndex {
                        segment: segment.to_string(),
                        index,
                        count: many.len(),
                        alternatives: self.alternatives(segment, many, candidates),
                    });
                }
                (many, Some(requested)) => {
                    let element = many.get(requested).ok_or_else(|| {
                        ElementPathError::IndexOutOfRange {
                            segment: segment.to_string(),
                            index,
                            requested,
                            count: many.len(),
                        }
                    })?;
                    if many.len() == 1 {
                        warnings.push(PathWarning::UnnecessaryIndex {
                            segment: segment.to_string(),
                            index,
                        });
                    }
                    *element
                }
            };
            current = Some(selected);
        }

        let last = path.len().saturating_sub(1);
        let element = current.ok_or_else(|| ElementPathError::ResolutionFailed {
            segment: path.segments().last().map(ToString::to_string).unwrap_or_default(),
            index: last,
            reason: "no element was selected by the final segment".to_string(),
            candidates: Vec::new(),
        })?;

        Ok(Resolution { element, warnings })
    }

    fn check_budget(&self, visited: usize, started: Instant) -> Result<(), ElementPathError> {
        if visited > self.budget.max_visited_nodes {
            log::warn!("Resolution visited {} elements; giving up.", visited);
            return Err(ElementPathError::ResolutionTimeout(format!(
                "inspected more than {} elements",
                self.budget.max_visited_nodes
            )));
        }
        if let Some(limit) = self.budget.time_limit {
            let elapsed = started.elapsed();
            if elapsed >= limit {
                log::warn!("Resolution exceeded its time limit ({:?}).", limit);
                return Err(ElementPathError::ResolutionTimeout(format!(
                    "took longer than {} ms",
                    limit.as_millis()
                )));
            }
        }
        Ok(())
    }

    /// Builds one replacement segment per match, each selecting exactly that match.
    /// Identifier-based refinements rank first, then title, then description, then a
    /// plain `#index`.
    fn alternatives(
        &self,
        segment: &PathSegment,
        matches: &[&UiElement],
        candidates: &[UiElement],
    ) -> Vec<String> {
        let base = segment.without_index();
        let mut ranked: Vec<(usize, usize, String)> = matches
            .iter()
            .enumerate()
            .map(|(position, element)| {
                let refined = attributes::IDENTIFYING.iter().enumerate().find_map(|(rank, name)| {
                    if base.predicates.contains_key(*name) {
                        return None;
                    }
                    let value = element.attribute_text(name)?;
                    let refined = base.clone().with_predicate(name, value.into_owned());
                    let unique = candidates
                        .iter()
                        .filter(|c| segment_matches(&refined, c))
                        .count()
                        == 1;
                    unique.then(|| (rank, refined.to_string()))
                });
                match refined {
                    Some((rank, text)) => (rank, position, text),
                    None => (
                        attributes::IDENTIFYING.len(),
                        position,
                        base.clone().with_index(position).to_string(),
                    ),
                }
            })
            .collect();

        ranked.sort();
        ranked
            .into_iter()
            .take(self.max_suggestions)
            .map(|(_, _, text)| text)
            .collect()
    }

    /// Candidates that satisfy part of the segment, best first.
    fn near_misses(&self, segment: &PathSegment, candidates: &[UiElement]) -> Vec<String> {
        let mut scored: Vec<(usize, usize, String)> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| !segment_matches(segment, c))
            .filter_map(|(position, c)| {
                let role_score = usize::from(!segment.role.is_empty() && c.role == segment.role) * 2;
                let predicate_score = segment
                    .predicates
                    .iter()
                    .filter(|(name, value)| c.attribute_text(name).as_deref() == Some(value.as_str()))
                    .count();
                let score = role_score + predicate_score;
                (score > 0).then(|| (score, position, c.summary()))
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(self.max_suggestions)
            .map(|(_, _, summary)| summary)
            .collect()
    }
}

/// Role equality (unless the segment role is empty) and every predicate must hold.
pub fn segment_matches(segment: &PathSegment, element: &UiElement) -> bool {
    (segment.role.is_empty() || element.role == segment.role)
        && segment
            .predicates
            .iter()
            .all(|(name, value)| element.attribute_text(name).as_deref() == Some(value.as_str()))
}

fn advisories(
    segment: &PathSegment,
    index: usize,
    selected: &UiElement,
    candidates: &[UiElement],
) -> Vec<PathWarning> {
    let mut warnings = Vec::new();

    if segment.predicates.is_empty() {
        let available = attributes::IDENTIFYING
            .iter()
            .find(|name| selected.attribute_text(name).is_some());
        if let Some(attribute) = available {
            warnings.push(PathWarning::MissingAttribute {
                segment: segment.to_string(),
                index,
                attribute: (*attribute).to_string(),
            });
        }
    }

    let similar = candidates
        .iter()
        .filter(|c| !std::ptr::eq(*c, selected) && c.role == selected.role)
        .count();
    if similar > 0 && !segment.predicates.contains_key(attributes::IDENTIFIER) {
        warnings.push(PathWarning::PotentialAmbiguity {
            segment: segment.to_string(),
            index,
            similar,
        });
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Calculator-like application with two identical unlabeled groups.
    fn calculator() -> UiElement {
        UiElement::new("AXApplication").with_title("Calculator").with_child(
            UiElement::new("AXWindow")
                .with_title("Calculator")
                .with_children([
                    UiElement::new("AXGroup").with_children([
                        UiElement::new("AXButton").with_description("7"),
                        UiElement::new("AXButton").with_description("8"),
                        UiElement::new("AXButton")
                            .with_description("Clear")
                            .with_identifier("clear"),
                    ]),
                    UiElement::new("AXGroup"),
                    UiElement::new("AXStaticText").with_value("0"),
                ]),
        )
    }

    #[test]
    fn test_resolve_unique_path() {
        let tree = calculator();
        let resolution = PathResolver::default()
            .resolve_str(
                r#"macos://ui/AXApplication[@AXTitle="Calculator"]/AXWindow/AXGroup#0/AXButton[@AXDescription="8"]"#,
                &tree,
            )
            .unwrap();

        assert_eq!(resolution.element.description.as_deref(), Some("8"));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let tree = calculator();
        let path = r#"macos://ui/AXApplication/AXWindow/AXGroup"#;
        let first = PathResolver::default().resolve_str(path, &tree).unwrap_err();
        for _ in 0..5 {
            assert_eq!(PathResolver::default().resolve_str(path, &tree).unwrap_err(), first);
        }
    }

    #[test]
    fn test_ambiguous_segment_without_index() {
        let tree = calculator();
        let err = PathResolver::default()
            .resolve_str("macos://ui/AXApplication/AXWindow/AXGroup", &tree)
            .unwrap_err();

        match err {
            ElementPathError::AmbiguousMatchNoIndex {
                index,
                count,
                alternatives,
                ..
            } => {
                assert_eq!(index, 2);
                assert_eq!(count, 2);
                assert_eq!(alternatives, vec!["AXGroup#0", "AXGroup#1"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_every_valid_index_resolves_ambiguous_segment() {
        let tree = calculator();
        for i in 0..3 {
            let path = format!("macos://ui/AXApplication/AXWindow/AXGroup#0/AXButton#{i}");
            assert!(PathResolver::default().resolve_str(&path, &tree).is_ok());
        }
    }

    #[test]
    fn test_ambiguity_alternatives_prefer_identifiers() {
        let tree = calculator();
        let err = PathResolver::default()
            .resolve_str("macos://ui/AXApplication/AXWindow/AXGroup#0/AXButton", &tree)
            .unwrap_err();

        let ElementPathError::AmbiguousMatchNoIndex { alternatives, count, .. } = err else {
            panic!("expected ambiguity");
        };
        assert_eq!(count, 3);
        assert_eq!(alternatives[0], r#"AXButton[@AXIdentifier="clear"]"#);
        assert_eq!(alternatives[1], r#"AXButton[@AXDescription="7"]"#);
        assert_eq!(alternatives[2], r#"AXButton[@AXDescription="8"]"#);
    }

    #[test]
    fn test_alternatives_are_capped() {
        let tree = calculator();
        let resolver = PathResolver::new(ResolutionBudget::default(), 1);
        let err = resolver
            .resolve_str("macos://ui/AXApplication/AXWindow/AXGroup#0/AXButton", &tree)
            .unwrap_err();
        let ElementPathError::AmbiguousMatchNoIndex { alternatives, .. } = err else {
            panic!("expected ambiguity");
        };
        assert_eq!(alternatives.len(), 1);
    }

    #[test]
    fn test_no_matching_elements_reports_segment() {
        let tree = calculator();
        let err = PathResolver::default()
            .resolve_str("macos://ui/AXApplication/AXWindow/AXSlider", &tree)
            .unwrap_err();
        assert_eq!(
            err,
            ElementPathError::NoMatchingElements {
                segment: "AXSlider".into(),
                index: 2
            }
        );
    }

    #[test]
    fn test_index_out_of_range() {
        let tree = calculator();
        let err = PathResolver::default()
            .resolve_str("macos://ui/AXApplication/AXWindow/AXGroup#2", &tree)
            .unwrap_err();
        assert!(matches!(
            err,
            ElementPathError::IndexOutOfRange {
                requested: 2,
                count: 2,
                ..
            }
        ));

        let err = PathResolver::default()
            .resolve_str("macos://ui/AXApplication/AXWindow#1", &tree)
            .unwrap_err();
        assert!(matches!(err, ElementPathError::IndexOutOfRange { count: 1, .. }));
    }

    #[test]
    fn test_unnecessary_index_is_a_warning() {
        let tree = calculator();
        let resolution = PathResolver::default()
            .resolve_str("macos://ui/AXApplication/AXWindow#0", &tree)
            .unwrap();
        assert!(resolution.warnings.iter().any(|w| matches!(
            w,
            PathWarning::UnnecessaryIndex { index: 1, .. }
        )));
    }

    #[test]
    fn test_advisory_warnings() {
        let tree = calculator();
        let resolution = PathResolver::default()
            .resolve_str(
                r#"macos://ui/AXApplication/AXWindow/AXGroup#0/AXButton[@AXDescription="7"]"#,
                &tree,
            )
            .unwrap();

        // The application exposes a title the path does not use.
        assert!(resolution.warnings.contains(&PathWarning::MissingAttribute {
            segment: "AXApplication".into(),
            index: 0,
            attribute: "AXTitle".into(),
        }));
        // The button has two same-role siblings and is not pinned by identifier.
        assert!(resolution.warnings.iter().any(|w| matches!(
            w,
            PathWarning::PotentialAmbiguity { index: 3, similar: 2, .. }
        )));
    }

    #[test]
    fn test_system_wide_root_starts_at_children() {
        let tree = UiElement::new(SYSTEM_WIDE_ROLE).with_children([
            UiElement::new("AXApplication").with_title("Finder"),
            UiElement::new("AXApplication").with_title("Notes"),
        ]);
        let resolution = PathResolver::default()
            .resolve_str(r#"macos://ui/AXApplication[@AXTitle="Notes"]"#, &tree)
            .unwrap();
        assert_eq!(resolution.element.title.as_deref(), Some("Notes"));
    }

    #[test]
    fn test_depth_budget() {
        let tree = calculator();
        let budget = ResolutionBudget {
            max_depth: 2,
            ..Default::default()
        };
        let err = PathResolver::new(budget, 5)
            .resolve_str("macos://ui/AXApplication/AXWindow/AXStaticText", &tree)
            .unwrap_err();
        assert!(matches!(err, ElementPathError::ResolutionTimeout(_)));
    }

    #[test]
    fn test_visited_budget() {
        let tree = calculator();
        let budget = ResolutionBudget {
            max_visited_nodes: 3,
            ..Default::default()
        };
        let err = PathResolver::new(budget, 5)
            .resolve_str("macos://ui/AXApplication/AXWindow/AXStaticText", &tree)
            .unwrap_err();
        assert!(matches!(err, ElementPathError::ResolutionTimeout(_)));
    }

    #[test]
    fn test_time_budget() {
        let tree = calculator();
        let budget = ResolutionBudget {
            time_limit: Some(Duration::ZERO),
            ..Default::default()
        };
        let err = PathResolver::new(budget, 5)
            .resolve_str("macos://ui/AXApplication", &tree)
            .unwrap_err();
        assert!(matches!(err, ElementPathError::ResolutionTimeout(ref msg) if msg.contains("0 ms")));

        // Without a limit the same lookup succeeds.
        let unlimited = ResolutionBudget {
            time_limit: None,
            ..Default::default()
        };
        assert!(PathResolver::new(unlimited, 5).resolve_str("macos://ui/AXApplication", &tree).is_ok());
    }

    #[test]
    fn test_outcome_conversion() {
        let tree = calculator();
        assert!(matches!(
            resolve("macos://ui/AXApplication/AXWindow/AXStaticText", &tree),
            ResolutionOutcome::Resolved { .. }
        ));
        assert!(matches!(
            resolve("macos://ui/AXApplication/AXWindow/AXGroup", &tree),
            ResolutionOutcome::Ambiguous { count: 2, segment_index: 2, .. }
        ));
        assert!(matches!(
            resolve("macos://ui/AXApplication/AXMenuBar", &tree),
            ResolutionOutcome::NotFound { segment_index: 1, .. }
        ));
        assert!(matches!(
            resolve("AXApplication", &tree),
            ResolutionOutcome::Error(ElementPathError::InvalidPathPrefix(_))
        ));
    }

    #[test]
    fn test_diagnose_reports_near_misses() {
        let tree = calculator();
        let path =
            ElementPath::parse(r#"macos://ui/AXApplication/AXWindow/AXGroup#0/AXButton[@AXDescription="9"]"#)
                .unwrap();
        let diagnosis = PathResolver::default().diagnose(&path, &tree);

        assert!(!diagnosis.is_success());
        assert_eq!(diagnosis.steps.len(), 4);
        let last = &diagnosis.steps[3];
        assert_eq!(last.candidates, 3);
        assert_eq!(last.matches, 0);
        assert_eq!(last.near_misses.len(), 3);
        assert!(last.near_misses[0].starts_with("AXButton"));
    }
}
