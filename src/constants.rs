// src/constants.rs

/// The scheme prefix every element path must start with.
pub const ELEMENT_PATH_PREFIX: &str = "macos://ui/";

/// The separator between element path segments.
pub const ELEMENT_PATH_SEPARATOR: char = '/';

/// The role of the virtual root of a system-wide snapshot. Paths resolved against it
/// start matching at its children instead of at the root itself.
pub const SYSTEM_WIDE_ROLE: &str = "AXSystemWide";

/// The separator used between the components of a human-readable menu path.
pub const MENU_PATH_SEPARATOR: &str = " > ";

/// Default number of menu hierarchies kept by the hierarchy cache.
pub const DEFAULT_HIERARCHY_CACHE_CAPACITY: usize = 50;

/// Default time-to-live, in seconds, of a cached menu hierarchy.
pub const DEFAULT_HIERARCHY_TTL_SECS: u64 = 300;

/// Default number of path/identifier pairs kept by the opaque id cache.
/// One entry exists per element rather than per application.
pub const DEFAULT_OPAQUE_ID_CAPACITY: usize = 128_000;

/// Default maximum number of segments a path may have before resolution is abandoned.
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 64;

/// Default maximum number of elements inspected during a single resolution.
pub const DEFAULT_MAX_VISITED_NODES: usize = 100_000;

/// Default number of alternatives attached to ambiguity errors and menu suggestions.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;

/// Name of the configuration file (inside the `axpath` config directory).
pub const CONFIG_FILENAME: &str = "axpath.toml";

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "AXPATH_CONFIG";
