// src/core/attributes.rs

//! Canonical accessibility attribute names and their accepted aliases.
//!
//! Paths and snapshots may spell the same attribute in more than one way (`identifier`,
//! `id`, `AXIdentifier`, ...). Everything is folded onto the canonical `AX*` spelling once,
//! at parse or construction time, so matching is a plain string comparison.

/// Visible label of windows, buttons and menu items.
pub const TITLE: &str = "AXTitle";
/// Current value of fields, sliders and the like.
pub const VALUE: &str = "AXValue";
/// Accessibility description, often the only label of icon buttons.
pub const DESCRIPTION: &str = "AXDescription";
/// Developer-assigned identifier, the most stable attribute.
pub const IDENTIFIER: &str = "AXIdentifier";

/// Canonical name followed by the aliases that map onto it.
static KNOWN_ATTRIBUTES: &[(&str, &[&str])] = &[
    (TITLE, &["title"]),
    (VALUE, &["value"]),
    (DESCRIPTION, &["description", "desc"]),
    (IDENTIFIER, &["identifier", "id", "AXDOMIdentifier"]),
    ("AXHelp", &["help"]),
    ("AXRoleDescription", &["roleDescription", "role_description"]),
    ("AXSubrole", &["subrole"]),
    ("AXPlaceholderValue", &["placeholder", "placeholderValue"]),
    ("AXLabel", &["label"]),
    ("AXURL", &["url"]),
    ("AXEnabled", &["enabled"]),
    ("AXFocused", &["focused"]),
    ("AXSelected", &["selected"]),
];

/// Attributes that identify an element, in the order they are preferred when building
/// or suggesting predicates.
pub const IDENTIFYING: &[&str] = &[IDENTIFIER, TITLE, DESCRIPTION];

/// Returns the canonical spelling of a known attribute name, or `None` for unknown names.
pub fn canonical_name(name: &str) -> Option<&'static str> {
    KNOWN_ATTRIBUTES
        .iter()
        .find(|(canonical, aliases)| *canonical == name || aliases.contains(&name))
        .map(|(canonical, _)| *canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_name_aliases() {
        assert_eq!(canonical_name("AXIdentifier"), Some(IDENTIFIER));
        assert_eq!(canonical_name("identifier"), Some(IDENTIFIER));
        assert_eq!(canonical_name("AXDOMIdentifier"), Some(IDENTIFIER));
        assert_eq!(canonical_name("desc"), Some(DESCRIPTION));
        assert_eq!(canonical_name("AXEnabled"), Some("AXEnabled"));
    }

    #[test]
    fn test_canonical_name_is_case_sensitive_and_rejects_unknown() {
        assert_eq!(canonical_name("Title"), None);
        assert_eq!(canonical_name("AXBogus"), None);
        assert_eq!(canonical_name(""), None);
    }
}
