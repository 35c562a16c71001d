// src/core/element_path.rs

//! # Element Paths
//!
//! Textual addresses for elements of an accessibility tree, e.g.
//! `macos://ui/AXApplication[@AXTitle="Calculator"]/AXWindow/AXGroup/AXButton[@AXDescription="7"]`.
//!
//! A path is a non-empty list of segments. Each segment names a role (empty means any role),
//! zero or more `[@name="value"]` predicates that must all match, and an optional `#index`
//! choosing among several matches at that level. Predicate names are normalized to their
//! canonical spelling here, at parse time.

use crate::constants::{ELEMENT_PATH_PREFIX, ELEMENT_PATH_SEPARATOR};
use crate::core::attributes;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

lazy_static! {
    // role, predicate block, optional index
    static ref SEGMENT_RE: Regex =
        Regex::new(r#"^(\*|[A-Za-z][A-Za-z0-9_]*)?((?:\[[^\]"]*(?:"(?:[^"\\]|\\.)*")?[^\]"]*\])*)(?:#(.*))?$"#)
            .unwrap();
    static ref PREDICATE_RE: Regex =
        Regex::new(r#"\[@([A-Za-z_][A-Za-z0-9_]*)="((?:[^"\\]|\\.)*)"\]"#).unwrap();
}

/// Broad class of an [`ElementPathError`], used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The path text itself is malformed. Detected before any traversal.
    Syntax,
    /// The path is well-formed but does not address exactly one element of this tree.
    Resolution,
    /// The traversal could not proceed for reasons unrelated to the path.
    Environment,
}

/// Everything that can go wrong while parsing or resolving an element path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ElementPathError {
    /// The path does not start with the `macos://ui/` scheme.
    #[error("Invalid path prefix in '{0}'. Element paths must start with 'macos://ui/'.")]
    InvalidPathPrefix(String),
    /// The path has no segments after the scheme.
    #[error("Empty element path.")]
    EmptyPath,
    /// A segment, predicate, or index is malformed.
    #[error("Invalid path syntax in '{text}': {reason}")]
    InvalidPathSyntax {
        /// The offending path or segment text.
        text: String,
        /// What is wrong with it.
        reason: String,
    },
    /// No child of the current element matches the segment.
    #[error("No elements match segment {index} ('{segment}').")]
    NoMatchingElements {
        /// The segment as written.
        segment: String,
        /// Zero-based position of the segment in the path.
        index: usize,
    },
    /// Several children match and the segment carries no index.
    #[error(
        "Segment {index} ('{segment}') matches {count} elements. Add an index or a more specific attribute."
    )]
    AmbiguousMatchNoIndex {
        /// The segment as written.
        segment: String,
        /// Zero-based position of the segment in the path.
        index: usize,
        /// How many children matched.
        count: usize,
        /// Ranked replacement segments that each select exactly one of the matches.
        alternatives: Vec<String>,
    },
    /// The segment's index is not below the number of matches.
    #[error(
        "Index {requested} is out of range for segment {index} ('{segment}'), which matches {count} element(s)."
    )]
    IndexOutOfRange {
        /// The segment as written.
        segment: String,
        /// Zero-based position of the segment in the path.
        index: usize,
        /// The `#index` the segment asked for.
        requested: usize,
        /// How many children matched.
        count: usize,
    },
    /// Resolution ended in a state that does not address a single element.
    #[error("Resolution failed at segment {index} ('{segment}'): {reason}")]
    ResolutionFailed {
        /// The segment being resolved when the walk stopped.
        segment: String,
        /// Zero-based position of that segment.
        index: usize,
        /// Why no single element was selected.
        reason: String,
        /// Summaries of elements that came close.
        candidates: Vec<String>,
    },
    /// The tree source refused access to the accessibility surface.
    #[error("Insufficient accessibility permissions: {0}")]
    InsufficientPermissions(String),
    /// The resolution budget (depth, visited elements, or time) was exhausted.
    #[error("Resolution abandoned: {0}")]
    ResolutionTimeout(String),
}

impl ElementPathError {
    /// Which [`ErrorCategory`] this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidPathPrefix(_) | Self::EmptyPath | Self::InvalidPathSyntax { .. } => {
                ErrorCategory::Syntax
            }
            Self::NoMatchingElements { .. }
            | Self::AmbiguousMatchNoIndex { .. }
            | Self::IndexOutOfRange { .. }
            | Self::ResolutionFailed { .. } => ErrorCategory::Resolution,
            Self::InsufficientPermissions(_) | Self::ResolutionTimeout(_) => {
                ErrorCategory::Environment
            }
        }
    }

    fn syntax(text: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPathSyntax {
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

/// Decimal digits only, with no sign and no leading zero, so each index has one spelling.
fn parse_index(text: &str, digits: &str) -> Result<usize, ElementPathError> {
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'));
    if !canonical {
        return Err(ElementPathError::syntax(text, "index must be a non-negative integer"));
    }
    digits
        .parse::<usize>()
        .map_err(|_| ElementPathError::syntax(text, "index is too large"))
}

/// One `Role[@name="value"]...#index` unit of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathSegment {
    /// Required role. Empty matches any role.
    pub role: String,
    /// Canonical attribute name → exact expected value.
    pub predicates: BTreeMap<String, String>,
    /// Zero-based choice among several matches.
    pub index: Option<usize>,
}

impl PathSegment {
    /// Segment matching `role` with no predicates and no index.
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Default::default()
        }
    }

    /// Adds a predicate. Unknown attribute names are kept verbatim; known ones are normalized.
    pub fn with_predicate(mut self, name: &str, value: impl Into<String>) -> Self {
        let key = attributes::canonical_name(name).unwrap_or(name);
        self.predicates.insert(key.to_string(), value.into());
        self
    }

    /// Selects the `index`-th match.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Parses a single segment (without separators).
    pub fn parse(text: &str) -> Result<Self, ElementPathError> {
        if text.is_empty() {
            return Err(ElementPathError::syntax(text, "empty segment"));
        }
        let caps = SEGMENT_RE
            .captures(text)
            .ok_or_else(|| ElementPathError::syntax(text, "expected Role[@name=\"value\"]#index"))?;

        let role = match caps.get(1).map(|m| m.as_str()) {
            None | Some("*") => String::new(),
            Some(role) => role.to_string(),
        };

        let block = caps.get(2).map_or("", |m| m.as_str());
        let predicates = parse_predicates(text, block)?;

        let index = match caps.get(3) {
            Some(m) => Some(parse_index(text, m.as_str())?),
            None => None,
        };

        if role.is_empty() && predicates.is_empty() && caps.get(1).is_none() {
            return Err(ElementPathError::syntax(text, "segment has neither role nor predicates"));
        }

        Ok(Self {
            role,
            predicates,
            index,
        })
    }

    /// The same segment without its index.
    pub fn without_index(&self) -> Self {
        Self {
            index: None,
            ..self.clone()
        }
    }
}

fn parse_predicates(text: &str, block: &str) -> Result<BTreeMap<String, String>, ElementPathError> {
    let mut predicates = BTreeMap::new();
    let mut consumed = 0;
    for caps in PREDICATE_RE.captures_iter(block) {
        let whole = caps.get(0).map_or("", |m| m.as_str());
        consumed += whole.len();

        let raw_name = caps.get(1).map_or("", |m| m.as_str());
        let name = attributes::canonical_name(raw_name).ok_or_else(|| {
            ElementPathError::syntax(text, format!("unknown attribute '{}'", raw_name))
        })?;
        let value = unescape(caps.get(2).map_or("", |m| m.as_str()));

        if predicates.insert(name.to_string(), value).is_some() {
            return Err(ElementPathError::syntax(
                text,
                format!("attribute '{}' appears more than once", name),
            ));
        }
    }
    // Anything the predicate pattern did not consume is malformed.
    if consumed != block.len() {
        return Err(ElementPathError::syntax(
            text,
            "predicates must look like [@name=\"value\"]",
        ));
    }
    Ok(predicates)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.role.is_empty() {
            write!(f, "*")?;
        } else {
            write!(f, "{}", self.role)?;
        }
        for (name, value) in &self.predicates {
            write!(f, "[@{}=\"{}\"]", name, escape(value))?;
        }
        if let Some(index) = self.index {
            write!(f, "#{}", index)?;
        }
        Ok(())
    }
}

/// A parsed element path. Always has at least one segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementPath {
    segments: Vec<PathSegment>,
}

impl ElementPath {
    /// Parses a full path, including the `macos://ui/` scheme.
    pub fn parse(text: &str) -> Result<Self, ElementPathError> {
        let body = text
            .strip_prefix(ELEMENT_PATH_PREFIX)
            .ok_or_else(|| ElementPathError::InvalidPathPrefix(text.to_string()))?;

        if body.trim().is_empty() {
            return Err(ElementPathError::EmptyPath);
        }

        let segments = split_segments(body)
            .ok_or_else(|| ElementPathError::syntax(text, "unterminated quoted value"))?
            .into_iter()
            .map(PathSegment::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }

    /// Builds a path from already-parsed segments.
    pub fn from_segments(segments: Vec<PathSegment>) -> Result<Self, ElementPathError> {
        if segments.is_empty() {
            return Err(ElementPathError::EmptyPath);
        }
        Ok(Self { segments })
    }

    /// Segments from the top-level element down.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// The path of the parent element, or `None` for a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        match self.segments.split_last() {
            Some((_, rest)) if !rest.is_empty() => Some(Self {
                segments: rest.to_vec(),
            }),
            _ => None,
        }
    }
}

impl FromStr for ElementPath {
    type Err = ElementPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", ELEMENT_PATH_PREFIX)?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", ELEMENT_PATH_SEPARATOR)?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Splits a path body on separators that are not inside quoted predicate values.
/// Returns `None` when a quote is left open.
fn split_segments(body: &str) -> Option<Vec<&str>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (i, c) in body.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c == ELEMENT_PATH_SEPARATOR && !in_quotes => {
                segments.push(body.get(start..i)?);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if in_quotes {
        return None;
    }
    segments.push(body.get(start..)?);
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_path() {
        let path = ElementPath::parse(
            r#"macos://ui/AXApplication[@AXTitle="Calculator"]/AXWindow/AXButton[@description="7"]#1"#,
        )
        .unwrap();

        assert_eq!(path.len(), 3);
        let segments = path.segments();
        assert_eq!(segments[0].role, "AXApplication");
        assert_eq!(segments[0].predicates.get("AXTitle").map(String::as_str), Some("Calculator"));
        assert_eq!(segments[1].predicates.len(), 0);
        assert_eq!(segments[1].index, None);
        // `description` is an alias, normalized at parse time.
        assert_eq!(segments[2].predicates.get("AXDescription").map(String::as_str), Some("7"));
        assert_eq!(segments[2].index, Some(1));
    }

    #[test]
    fn test_parse_multiple_predicates_are_unordered() {
        let a = ElementPath::parse(r#"macos://ui/AXButton[@AXTitle="OK"][@AXIdentifier="ok"]"#).unwrap();
        let b = ElementPath::parse(r#"macos://ui/AXButton[@id="ok"][@title="OK"]"#).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_value_with_separator_and_escapes() {
        let path =
            ElementPath::parse(r#"macos://ui/AXWindow[@AXTitle="a/b \"c\" #2"]/AXButton"#).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(
            path.segments()[0].predicates.get("AXTitle").map(String::as_str),
            Some(r#"a/b "c" #2"#)
        );
    }

    #[test]
    fn test_display_round_trips() {
        let text = r#"macos://ui/AXApplication[@AXTitle="Notes"]/*[@AXIdentifier="x\\y"]/AXButton#0"#;
        let path = ElementPath::parse(text).unwrap();
        let rendered = path.to_string();
        assert_eq!(rendered, text);
        assert_eq!(ElementPath::parse(&rendered).unwrap(), path);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ElementPath::parse("ui://AXWindow"),
            Err(ElementPathError::InvalidPathPrefix(_))
        ));
        assert_eq!(ElementPath::parse("macos://ui/"), Err(ElementPathError::EmptyPath));

        for bad in [
            "macos://ui/AXWindow//AXButton",
            "macos://ui/AXWindow[AXTitle=\"x\"]",
            "macos://ui/AXWindow[@AXTitle=x]",
            "macos://ui/AXWindow[@AXBogus=\"x\"]",
            "macos://ui/AXWindow[@AXTitle=\"a\"][@title=\"b\"]",
            "macos://ui/AXWindow#",
            "macos://ui/AXWindow#-1",
            "macos://ui/AXWindow#x",
            "macos://ui/AXWindow[@AXTitle=\"open",
            "macos://ui/1Window",
        ] {
            let err = ElementPath::parse(bad).unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Syntax, "expected syntax error for {bad}");
        }
    }

    #[test]
    fn test_index_has_a_single_spelling() {
        for bad in ["AXWindow#+1", "AXWindow#007", "AXWindow#00", "AXWindow# 1", "AXWindow#99999999999999999999999"] {
            assert!(
                matches!(PathSegment::parse(bad), Err(ElementPathError::InvalidPathSyntax { .. })),
                "expected {bad} to be rejected"
            );
        }
        assert_eq!(PathSegment::parse("AXWindow#0").unwrap().index, Some(0));
        assert_eq!(PathSegment::parse("AXWindow#10").unwrap().index, Some(10));
    }

    #[test]
    fn test_wildcard_and_role_less_segments() {
        let path = ElementPath::parse(r#"macos://ui/*/[@AXTitle="Go"]"#).unwrap();
        assert_eq!(path.segments()[0].role, "");
        assert_eq!(path.segments()[1].role, "");
        assert_eq!(path.segments()[1].predicates.len(), 1);
    }

    #[test]
    fn test_parent_and_child() {
        let path = ElementPath::parse("macos://ui/AXApplication/AXWindow").unwrap();
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "macos://ui/AXApplication");
        assert!(parent.parent().is_none());
        assert_eq!(parent.child(PathSegment::new("AXWindow")), path);
    }

    #[test]
    fn test_error_categories() {
        let err = ElementPathError::NoMatchingElements {
            segment: "AXButton".into(),
            index: 2,
        };
        assert_eq!(err.category(), ErrorCategory::Resolution);
        assert_eq!(
            ElementPathError::ResolutionTimeout("x".into()).category(),
            ErrorCategory::Environment
        );
        assert!(err.to_string().contains("segment 2"));
    }
}
