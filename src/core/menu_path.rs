// src/core/menu_path.rs

//! # Menu Paths
//!
//! Human-readable addresses for menu items, e.g. `File > Save As…`. A menu path is looked
//! up in a pre-fetched [`MenuHierarchy`]: exact match first, then case-insensitive partial
//! matches, and only when nothing contains the query, edit-distance based suggestions.

use crate::constants::MENU_PATH_SEPARATOR;
use crate::models::MenuHierarchy;
use thiserror::Error;

const SCORE_EXACT: usize = 10;
const SCORE_SUBSTRING: usize = 5;
const SCORE_CLOSE: usize = 2;
const CLOSE_DISTANCE: usize = 2;

/// Errors raised while validating or resolving a menu path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MenuPathError {
    /// The path has no components.
    #[error("Menu path is empty.")]
    Empty,
    /// The path has a leading, trailing, or doubled separator.
    #[error("Invalid menu path '{path}': {reason}")]
    InvalidSeparator {
        /// The path as given.
        path: String,
        /// Which separator rule it breaks.
        reason: String,
    },
    /// Nothing in the hierarchy resembles the path.
    #[error("Menu path '{path}' not found in the menus of '{application_id}'.")]
    NotFound {
        /// The path as given.
        path: String,
        /// Application whose menus were searched.
        application_id: String,
    },
}

/// Result of looking a menu path up in a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuResolution {
    /// The path exists verbatim.
    Exact(String),
    /// Paths containing the query (case-insensitive), best first.
    Partial(Vec<String>),
    /// Closest paths by component similarity, best first.
    Suggestions(Vec<String>),
}

/// Splits a menu path into trimmed, non-empty components.
pub fn parse_menu_path(text: &str) -> Vec<String> {
    text.split(MENU_PATH_SEPARATOR)
        .map(str::trim)
        .filter(|component| !component.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins components with the menu separator.
pub fn join_menu_path<S: AsRef<str>>(components: &[S]) -> String {
    components
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(MENU_PATH_SEPARATOR)
}

/// Rejects empty paths and leading, trailing, or doubled separators.
pub fn validate_menu_path(text: &str) -> Result<(), MenuPathError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(MenuPathError::Empty);
    }

    let marker = MENU_PATH_SEPARATOR.trim();
    let invalid = |reason: &str| MenuPathError::InvalidSeparator {
        path: text.to_string(),
        reason: reason.to_string(),
    };

    if trimmed.starts_with(marker) {
        return Err(invalid("leading separator"));
    }
    if trimmed.ends_with(marker) {
        return Err(invalid("trailing separator"));
    }
    let doubled = trimmed.split(MENU_PATH_SEPARATOR).any(|component| {
        let component = component.trim();
        component.is_empty() || component.starts_with(marker) || component.ends_with(marker)
    });
    if doubled {
        return Err(invalid("doubled separator"));
    }
    Ok(())
}

/// Validates `text` and looks it up in `hierarchy`.
pub fn resolve_menu_path(
    text: &str,
    hierarchy: &MenuHierarchy,
    max_suggestions: usize,
) -> Result<MenuResolution, MenuPathError> {
    validate_menu_path(text)?;
    let query = join_menu_path(&parse_menu_path(text));

    if hierarchy.contains_path(&query) {
        return Ok(MenuResolution::Exact(query));
    }

    let mut partial = partial_matches(&query, hierarchy.all_paths());
    if !partial.is_empty() {
        partial.truncate(max_suggestions);
        log::debug!("Menu path '{}' matched {} partial path(s).", query, partial.len());
        return Ok(MenuResolution::Partial(partial));
    }

    let suggestions = fuzzy_suggestions(&query, hierarchy.all_paths(), max_suggestions);
    if suggestions.is_empty() {
        return Err(MenuPathError::NotFound {
            path: query,
            application_id: hierarchy.application_id.clone(),
        });
    }
    Ok(MenuResolution::Suggestions(suggestions))
}

/// Paths containing `query` case-insensitively. Prefix matches come first, then shorter paths.
pub fn partial_matches<'a>(query: &str, paths: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let needle = query.to_lowercase();
    let mut found: Vec<(bool, usize, &str)> = paths
        .into_iter()
        .filter_map(|path| {
            let haystack = path.to_lowercase();
            haystack
                .contains(&needle)
                .then(|| (!haystack.starts_with(&needle), path.chars().count(), path))
        })
        .collect();
    found.sort();
    found.into_iter().map(|(_, _, path)| path.to_string()).collect()
}

/// Ranks `paths` by component similarity with `query` and returns at most `limit` of them.
pub fn fuzzy_suggestions<'a>(
    query: &str,
    paths: impl IntoIterator<Item = &'a str>,
    limit: usize,
) -> Vec<String> {
    let query_components: Vec<String> = parse_menu_path(query)
        .into_iter()
        .map(|c| c.to_lowercase())
        .collect();

    let mut scored: Vec<(usize, usize, &str)> = paths
        .into_iter()
        .filter_map(|path| {
            let score = similarity_score(&query_components, path);
            (score > 0).then(|| (score, path.chars().count(), path))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(b.2)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, _, path)| path.to_string())
        .collect()
}

fn similarity_score(query_components: &[String], candidate: &str) -> usize {
    let candidate_components: Vec<String> = parse_menu_path(candidate)
        .into_iter()
        .map(|c| c.to_lowercase())
        .collect();

    query_components
        .iter()
        .flat_map(|q| candidate_components.iter().map(move |c| (q, c)))
        .map(|(q, c)| {
            if q == c {
                SCORE_EXACT
            } else if q.contains(c.as_str()) || c.contains(q.as_str()) {
                SCORE_SUBSTRING
            } else if levenshtein(q, c) <= CLOSE_DISTANCE {
                SCORE_CLOSE
            } else {
                0
            }
        })
        .sum()
}

/// Edit distance between two menu components, counted in Unicode scalar values.
pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}
