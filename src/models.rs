// src/models.rs

use crate::constants::MENU_PATH_SEPARATOR;
use crate::core::attributes;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::time::{Duration, SystemTime};

// --- TREE MODELS ---
// These are what the tree-fetch collaborator hands us, one batch per snapshot.

/// Screen rectangle of an element (origin + size), in screen points.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Frame {
    /// Creates a frame from its origin and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether the point lies inside the frame. Empty frames contain nothing.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && x >= self.x
            && y >= self.y
            && x < self.x + self.width
            && y < self.y + self.height
    }
}

/// A scalar attribute value as reported by the accessibility surface.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AttributeValue {
    /// `true` or `false`.
    Bool(bool),
    /// Whole number.
    Integer(i64),
    /// Floating-point number.
    Float(f64),
    /// Any other value, as text.
    Text(String),
}

impl AttributeValue {
    /// The textual form used when comparing against `[@name="value"]` predicates.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Bool(b) => Cow::Owned(b.to_string()),
            Self::Integer(i) => Cow::Owned(i.to_string()),
            Self::Float(f) => Cow::Owned(f.to_string()),
            Self::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// One node of an accessibility tree snapshot.
///
/// Children are owned. The parent is a non-owning back-reference: it holds the parent's
/// path, which is unique within a snapshot and can be looked up in the flattened
/// path → element map of that snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct UiElement {
    /// Fully-qualified element path. Empty until paths are generated for the tree.
    #[serde(default)]
    pub path: String,
    /// Accessibility role, e.g. `AXButton`.
    pub role: String,
    /// `AXTitle`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `AXValue`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// `AXDescription`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `AXIdentifier`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// On-screen bounds.
    #[serde(default)]
    pub frame: Frame,
    /// Other attributes, keyed by canonical name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, AttributeValue>,
    /// Action names the element supports, e.g. `AXPress`.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub actions: BTreeSet<String>,
    /// Child elements in on-screen order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<UiElement>,
    /// Path of the parent element. `None` for roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_path: Option<String>,
}

impl UiElement {
    /// Creates a bare element with the given role.
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            ..Default::default()
        }
    }

    /// Sets `title`.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets `value`.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets `description`.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets `identifier`.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Sets `frame`.
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.frame = frame;
        self
    }

    /// Sets `path` without touching the children.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Adds an attribute, storing it under its canonical name.
    pub fn with_attribute(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        let key = attributes::canonical_name(name).unwrap_or(name);
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Adds a supported action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.insert(action.into());
        self
    }

    /// Appends one child.
    pub fn with_child(mut self, child: UiElement) -> Self {
        self.children.push(child);
        self
    }

    /// Appends children in order.
    pub fn with_children(mut self, children: impl IntoIterator<Item = UiElement>) -> Self {
        self.children.extend(children);
        self
    }

    /// Looks up an attribute by its canonical name, checking the dedicated fields first.
    pub fn attribute_text(&self, canonical: &str) -> Option<Cow<'_, str>> {
        let field = match canonical {
            attributes::TITLE => self.title.as_deref(),
            attributes::VALUE => self.value.as_deref(),
            attributes::DESCRIPTION => self.description.as_deref(),
            attributes::IDENTIFIER => self.identifier.as_deref(),
            _ => None,
        };
        match field {
            Some(text) => Some(Cow::Borrowed(text)),
            None => self.attributes.get(canonical).map(AttributeValue::as_text),
        }
    }

    /// Compares every property except the children and the path bookkeeping.
    pub fn same_properties(&self, other: &Self) -> bool {
        self.role == other.role
            && self.title == other.title
            && self.value == other.value
            && self.description == other.description
            && self.identifier == other.identifier
            && self.frame == other.frame
            && self.attributes == other.attributes
            && self.actions == other.actions
    }

    /// Rewrites attribute keys to their canonical spelling, recursively.
    ///
    /// Snapshots coming from the collaborator may spell the same attribute in several ways.
    /// Normalizing once at construction keeps predicate matching a plain map lookup.
    pub fn normalize_attributes(&mut self) {
        if !self.attributes.is_empty() {
            let raw = std::mem::take(&mut self.attributes);
            for (name, value) in raw {
                let key = attributes::canonical_name(&name).unwrap_or(&name).to_string();
                self.attributes.entry(key).or_insert(value);
            }
        }
        for child in &mut self.children {
            child.normalize_attributes();
        }
    }

    /// Total number of elements in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_len).sum::<usize>()
    }

    /// A short, human-readable description used in diagnostics and suggestions.
    pub fn summary(&self) -> String {
        let mut out = self.role.clone();
        for (label, text) in [
            ("identifier", &self.identifier),
            ("title", &self.title),
            ("description", &self.description),
        ] {
            if let Some(text) = text {
                out.push_str(&format!(" {}=\"{}\"", label, text));
            }
        }
        out
    }
}

impl fmt::Display for UiElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

// --- MENU MODELS ---

/// One entry of an application's menu bar, with its submenu items.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MenuItem {
    /// Text shown in the menu.
    pub title: String,
    /// Element path of the backing accessibility element, when it was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_path: Option<String>,
    /// Whether the item can be chosen. Defaults to `true`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Keyboard shortcut as displayed, e.g. `⌘S`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    /// Submenu items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

fn default_enabled() -> bool {
    true
}

impl MenuItem {
    /// Enabled item with no submenu.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            element_path: None,
            enabled: true,
            shortcut: None,
            children: Vec::new(),
        }
    }

    /// Appends submenu items.
    pub fn with_children(mut self, children: impl IntoIterator<Item = MenuItem>) -> Self {
        self.children.extend(children);
        self
    }

    /// Records the backing element's path.
    pub fn with_element_path(mut self, path: impl Into<String>) -> Self {
        self.element_path = Some(path.into());
        self
    }
}

/// A precomputed snapshot of an application's complete menu structure.
///
/// Immutable between creation and destruction; a stale hierarchy is replaced, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuHierarchy {
    /// Application the menus belong to.
    pub application_id: String,
    /// Titles of the menu bar entries, in order.
    pub top_level_menus: Vec<String>,
    /// When the menus were captured.
    pub generated_at: SystemTime,
    /// First instant at which the hierarchy is stale.
    pub expires_at: SystemTime,
    /// Deepest menu level reached.
    pub explored_depth: usize,
    /// Number of menu items, menu bar entries included.
    pub total_items: usize,
    /// The menu bar entries with their submenus.
    pub menus: Vec<MenuItem>,
    /// Every full menu path, in depth-first order, mapped to its element path (if known).
    paths: Vec<(String, Option<String>)>,
}

impl MenuHierarchy {
    /// Builds a hierarchy generated now and valid for `ttl`.
    pub fn new(application_id: impl Into<String>, menus: Vec<MenuItem>, ttl: Duration) -> Self {
        Self::new_at(application_id, menus, ttl, SystemTime::now())
    }

    /// Builds a hierarchy as if it had been generated at `generated_at`.
    pub fn new_at(
        application_id: impl Into<String>,
        menus: Vec<MenuItem>,
        ttl: Duration,
        generated_at: SystemTime,
    ) -> Self {
        let mut paths = Vec::new();
        let mut explored_depth = 0;
        for menu in &menus {
            collect_menu_paths(menu, &[], 1, &mut paths, &mut explored_depth);
        }
        Self {
            application_id: application_id.into(),
            top_level_menus: menus.iter().map(|m| m.title.clone()).collect(),
            generated_at,
            expires_at: expiry_after(generated_at, ttl),
            explored_depth,
            total_items: paths.len(),
            menus,
            paths,
        }
    }

    /// Returns a copy with a new expiry, leaving the contents untouched.
    pub fn with_expiry(mut self, expires_at: SystemTime) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Whether the hierarchy is still fresh at `now`.
    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        now < self.expires_at
    }

    /// Whether the hierarchy is still fresh.
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(SystemTime::now())
    }

    /// Every full menu path known to this hierarchy (e.g. `"File > Save As…"`).
    pub fn all_paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(|(path, _)| path.as_str())
    }

    /// Whether `menu_path` names an item exactly.
    pub fn contains_path(&self, menu_path: &str) -> bool {
        self.paths.iter().any(|(path, _)| path == menu_path)
    }

    /// Element path of the accessibility element backing `menu_path`.
    pub fn element_path_for(&self, menu_path: &str) -> Option<&str> {
        self.paths
            .iter()
            .find(|(path, _)| path == menu_path)
            .and_then(|(_, element)| element.as_deref())
    }

    /// Number of items below each top-level menu.
    pub fn item_counts(&self) -> HashMap<&str, usize> {
        self.menus
            .iter()
            .map(|m| (m.title.as_str(), count_items(m) - 1))
            .collect()
    }
}

/// `start + ttl`, clamped to the latest representable time instead of overflowing.
pub(crate) fn expiry_after(start: SystemTime, ttl: Duration) -> SystemTime {
    let mut ttl = ttl;
    loop {
        if let Some(expiry) = start.checked_add(ttl) {
            return expiry;
        }
        ttl /= 2;
    }
}

fn count_items(item: &MenuItem) -> usize {
    1 + item.children.iter().map(count_items).sum::<usize>()
}

fn collect_menu_paths(
    item: &MenuItem,
    prefix: &[&str],
    depth: usize,
    out: &mut Vec<(String, Option<String>)>,
    max_depth: &mut usize,
) {
    let mut components = prefix.to_vec();
    components.push(item.title.as_str());
    *max_depth = (*max_depth).max(depth);
    out.push((
        components.join(MENU_PATH_SEPARATOR),
        item.element_path.clone(),
    ));
    for child in &item.children {
        collect_menu_paths(child, &components, depth + 1, out, max_depth);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_menus() -> Vec<MenuItem> {
        vec![
            MenuItem::new("File").with_children([
                MenuItem::new("Save").with_element_path("macos://ui/AXMenuItem[@AXTitle=\"Save\"]"),
                MenuItem::new("Export").with_children([MenuItem::new("PDF")]),
            ]),
            MenuItem::new("Edit").with_children([MenuItem::new("Undo")]),
        ]
    }

    #[test]
    fn test_menu_hierarchy_metadata() {
        let hierarchy = MenuHierarchy::new("com.example.app", sample_menus(), Duration::from_secs(60));

        assert_eq!(hierarchy.top_level_menus, vec!["File", "Edit"]);
        assert_eq!(hierarchy.total_items, 6);
        assert_eq!(hierarchy.explored_depth, 3);
        assert!(hierarchy.contains_path("File > Export > PDF"));
        assert_eq!(hierarchy.item_counts().get("File"), Some(&3));
        assert_eq!(
            hierarchy.element_path_for("File > Save"),
            Some("macos://ui/AXMenuItem[@AXTitle=\"Save\"]")
        );
        assert_eq!(hierarchy.element_path_for("Edit > Undo"), None);
    }

    #[test]
    fn test_menu_hierarchy_expiry() {
        let t0 = SystemTime::now();
        let hierarchy = MenuHierarchy::new_at("app", sample_menus(), Duration::from_secs(10), t0);

        assert!(hierarchy.is_valid_at(t0));
        assert!(hierarchy.is_valid_at(t0 + Duration::from_secs(9)));
        assert!(!hierarchy.is_valid_at(t0 + Duration::from_secs(10)));

        // An unbounded TTL clamps instead of overflowing.
        let forever = MenuHierarchy::new_at("app", sample_menus(), Duration::MAX, t0);
        assert!(forever.is_valid_at(t0 + Duration::from_secs(10 * 365 * 24 * 3600)));
    }

    #[test]
    fn test_attribute_lookup_prefers_dedicated_fields() {
        let element = UiElement::new("AXButton")
            .with_title("OK")
            .with_attribute("identifier", "ok-button")
            .with_attribute("AXEnabled", true);

        assert_eq!(element.attribute_text("AXTitle").as_deref(), Some("OK"));
        // Stored under the canonical key, so the alias is gone after construction.
        assert_eq!(element.attribute_text("AXIdentifier").as_deref(), Some("ok-button"));
        assert_eq!(element.attribute_text("AXEnabled").as_deref(), Some("true"));
        assert_eq!(element.attribute_text("AXHelp"), None);
    }

    #[test]
    fn test_normalize_attributes_recurses() {
        let raw = r#"{
            "role": "AXWindow",
            "attributes": { "id": "main" },
            "children": [ { "role": "AXButton", "attributes": { "desc": "Close" } } ]
        }"#;
        let mut element: UiElement = serde_json::from_str(raw).unwrap();
        element.normalize_attributes();

        assert!(element.attributes.contains_key("AXIdentifier"));
        assert_eq!(
            element.children[0].attribute_text("AXDescription").as_deref(),
            Some("Close")
        );
    }
}
