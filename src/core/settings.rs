// src/core/settings.rs

//! # Settings
//!
//! Tunables for the caches, the resolver, and menu lookups, read from `axpath.toml`.
//! Every field has a default, so a partial file (or no file at all) is valid.

use crate::constants::{
    CONFIG_FILENAME, CONFIG_PATH_ENV, DEFAULT_HIERARCHY_CACHE_CAPACITY, DEFAULT_HIERARCHY_TTL_SECS,
    DEFAULT_MAX_RESOLUTION_DEPTH, DEFAULT_MAX_SUGGESTIONS, DEFAULT_MAX_VISITED_NODES,
    DEFAULT_OPAQUE_ID_CAPACITY,
};
use crate::core::path_resolver::ResolutionBudget;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while locating, reading, or validating `axpath.toml`.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The platform has no config directory and `$AXPATH_CONFIG` is unset.
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    /// The file exists but could not be read.
    #[error("Could not read settings file '{path}': {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML or has fields of the wrong type.
    #[error("Could not parse settings file '{path}': {source}")]
    TomlParse {
        /// File, or origin label, that failed.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
    /// A value parsed but is out of range.
    #[error("Invalid setting '{key}': {reason}")]
    Invalid {
        /// Dotted key, e.g. `resolver.max_depth`.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// `[hierarchy_cache]` section.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HierarchyCacheSettings {
    /// Maximum number of cached applications.
    pub capacity: usize,
    /// Seconds a cached hierarchy stays valid.
    pub ttl_secs: u64,
}

impl Default for HierarchyCacheSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_HIERARCHY_CACHE_CAPACITY,
            ttl_secs: DEFAULT_HIERARCHY_TTL_SECS,
        }
    }
}

impl HierarchyCacheSettings {
    /// `ttl_secs` as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// `[opaque_ids]` section.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct OpaqueIdSettings {
    /// Maximum number of live element ids.
    pub capacity: usize,
}

impl Default for OpaqueIdSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_OPAQUE_ID_CAPACITY,
        }
    }
}

/// `[resolver]` section.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverSettings {
    /// Maximum path length, also used as the snapshot depth.
    pub max_depth: usize,
    /// Maximum number of elements inspected per resolution.
    pub max_visited_nodes: usize,
    /// Wall-clock limit per resolution. Absent means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,
    /// Cap on alternatives listed for an ambiguous segment.
    pub max_suggestions: usize,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
            max_visited_nodes: DEFAULT_MAX_VISITED_NODES,
            time_limit_ms: None,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

impl ResolverSettings {
    /// The resolver limits these settings describe.
    pub fn budget(&self) -> ResolutionBudget {
        ResolutionBudget {
            max_depth: self.max_depth,
            max_visited_nodes: self.max_visited_nodes,
            time_limit: self.time_limit_ms.map(Duration::from_millis),
        }
    }
}

/// `[menu]` section.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MenuSettings {
    /// Cap on suggestions returned for an unresolved menu path.
    pub max_suggestions: usize,
}

impl Default for MenuSettings {
    fn default() -> Self {
        Self {
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }
}

/// Contents of `axpath.toml`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Settings {
    /// Menu hierarchy cache limits.
    pub hierarchy_cache: HierarchyCacheSettings,
    /// Opaque id cache limits.
    pub opaque_ids: OpaqueIdSettings,
    /// Element path resolution limits.
    pub resolver: ResolverSettings,
    /// Menu path lookup options.
    pub menu: MenuSettings,
}

impl Settings {
    /// Parses and validates settings from TOML text.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content).map_err(|e| SettingsError::TomlParse {
            path: origin.to_string(),
            source: e,
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            log::debug!("No settings file at '{}'; using defaults.", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        log::debug!("Loading settings from '{}'.", path.display());
        Self::from_toml_str(&content, &path.display().to_string())
    }

    /// Loads settings from `$AXPATH_CONFIG`, or from `<config dir>/axpath/axpath.toml`.
    pub fn load_default() -> Result<Self, SettingsError> {
        Self::load(&settings_path()?)
    }

    /// Rejects values that would make a cache or a suggestion list useless.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let checks = [
            ("hierarchy_cache.capacity", self.hierarchy_cache.capacity),
            ("opaque_ids.capacity", self.opaque_ids.capacity),
            ("resolver.max_depth", self.resolver.max_depth),
            ("resolver.max_visited_nodes", self.resolver.max_visited_nodes),
            ("resolver.max_suggestions", self.resolver.max_suggestions),
            ("menu.max_suggestions", self.menu.max_suggestions),
        ];
        for (key, value) in checks {
            if value == 0 {
                return Err(SettingsError::Invalid {
                    key: key.to_string(),
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Renders the settings as a complete `axpath.toml`.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Where settings are read from. `$AXPATH_CONFIG` takes precedence.
pub fn settings_path() -> Result<PathBuf, SettingsError> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let dir = dirs::config_dir().ok_or(SettingsError::ConfigDirNotFound)?;
    Ok(dir.join("axpath").join(CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.hierarchy_cache.capacity, 50);
        assert_eq!(settings.hierarchy_cache.ttl(), Duration::from_secs(300));
        assert_eq!(settings.opaque_ids.capacity, 128_000);
        assert_eq!(settings.resolver.budget(), ResolutionBudget::default());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[hierarchy_cache]\nttl_secs = 60\n\n[resolver]\ntime_limit_ms = 250"
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.hierarchy_cache.ttl_secs, 60);
        assert_eq!(settings.hierarchy_cache.capacity, 50);
        assert_eq!(
            settings.resolver.budget().time_limit,
            Some(Duration::from_millis(250))
        );
        assert_eq!(settings.menu, MenuSettings::default());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = Settings::from_toml_str("[opaque_ids]\ncapacity = 0", "inline").unwrap_err();
        match err {
            SettingsError::Invalid { key, .. } => assert_eq!(key, "opaque_ids.capacity"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = Settings::from_toml_str("[menu\nmax_suggestions = 3", "inline").unwrap_err();
        assert!(matches!(err, SettingsError::TomlParse { .. }));
    }

    #[test]
    fn test_serialized_settings_parse_back() {
        let mut settings = Settings::default();
        settings.menu.max_suggestions = 9;
        settings.resolver.time_limit_ms = Some(1_000);

        let text = settings.to_toml_string().unwrap();
        assert_eq!(Settings::from_toml_str(&text, "inline").unwrap(), settings);
    }
}
