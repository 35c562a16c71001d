// src/addressing.rs

//! # Addressing Service
//!
//! One handle over everything a tool layer needs: element path resolution, menu path lookup
//! backed by the shared hierarchy cache, opaque element ids, snapshots, and change sets.
//!
//! `Addressing` is cheap to clone. Clones share the same caches, so it can be handed to every
//! worker that serves requests.

use crate::core::change_detector::{self, ChangeSet};
use crate::core::element_path::{ElementPath, ElementPathError};
use crate::core::hierarchy_cache::{CacheStatistics, HierarchyCache};
use crate::core::menu_path::{self, MenuPathError, MenuResolution};
use crate::core::opaque_id::{OpaqueIdCache, OpaqueIdError};
use crate::core::path_generator::{self, Snapshot};
use crate::core::path_resolver::{Diagnosis, PathResolver, Resolution, ResolutionOutcome};
use crate::core::settings::Settings;
use crate::core::tree_source::{SnapshotScope, SourceError, TreeSource};
use crate::models::{MenuHierarchy, UiElement};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by the [`Addressing`] service.
#[derive(Error, Debug)]
pub enum AddressingError {
    /// Element path parsing or resolution failed.
    #[error(transparent)]
    Path(#[from] ElementPathError),
    /// Menu path validation or lookup failed.
    #[error(transparent)]
    Menu(#[from] MenuPathError),
    /// An element id could not be decoded.
    #[error(transparent)]
    OpaqueId(#[from] OpaqueIdError),
    /// The tree source could not produce a snapshot.
    #[error(transparent)]
    Source(#[from] SourceError),
    /// Menu lookup was asked for an application with no cached hierarchy.
    #[error("No menu hierarchy cached for '{0}'.")]
    MenuNotCached(String),
}

impl AddressingError {
    /// Folds source permission failures into the path error space.
    fn from_source(err: SourceError) -> Self {
        match err.as_path_error() {
            Some(path_err) => Self::Path(path_err),
            None => Self::Source(err),
        }
    }
}

/// Shared entry point over resolution, menu lookup, element ids and diffing.
#[derive(Debug, Clone)]
pub struct Addressing {
    hierarchies: Arc<HierarchyCache>,
    ids: Arc<OpaqueIdCache>,
    resolver: PathResolver,
    menu_suggestions: usize,
}

impl Default for Addressing {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl Addressing {
    /// Builds the service and its caches from `settings`.
    pub fn new(settings: &Settings) -> Self {
        Self {
            hierarchies: Arc::new(HierarchyCache::new(
                settings.hierarchy_cache.capacity,
                settings.hierarchy_cache.ttl(),
            )),
            ids: Arc::new(OpaqueIdCache::new(settings.opaque_ids.capacity)),
            resolver: PathResolver::new(
                settings.resolver.budget(),
                settings.resolver.max_suggestions,
            ),
            menu_suggestions: settings.menu.max_suggestions,
        }
    }

    /// The resolver configured from the settings.
    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    // --- Element paths ---

    /// Parses and resolves `path_text` against `root`.
    pub fn resolve<'t>(&self, path_text: &str, root: &'t UiElement) -> ResolutionOutcome<'t> {
        self.resolver.resolve_str(path_text, root).into()
    }

    /// Step-by-step trace of resolving `path_text`, for troubleshooting.
    pub fn diagnose(&self, path_text: &str, root: &UiElement) -> Result<Diagnosis, ElementPathError> {
        let path = ElementPath::parse(path_text)?;
        Ok(self.resolver.diagnose(&path, root))
    }

    /// Takes a snapshot of `scope`, bounded by the resolver's depth limit.
    pub fn snapshot<S: TreeSource + ?Sized>(
        &self,
        source: &S,
        scope: &SnapshotScope,
    ) -> Result<UiElement, AddressingError> {
        source
            .snapshot(scope, self.resolver.budget().max_depth)
            .map_err(AddressingError::from_source)
    }

    // --- Menu paths ---

    /// Looks `menu_path` up in the cached hierarchy of `application_id`.
    pub fn resolve_menu_path(
        &self,
        application_id: &str,
        menu_path: &str,
    ) -> Result<MenuResolution, AddressingError> {
        let hierarchy = self
            .hierarchies
            .get(application_id)
            .ok_or_else(|| AddressingError::MenuNotCached(application_id.to_string()))?;
        Ok(menu_path::resolve_menu_path(
            menu_path,
            &hierarchy,
            self.menu_suggestions,
        )?)
    }

    /// Returns the cached hierarchy for `application_id`, building and caching it on a miss.
    pub fn menu_hierarchy_or_fetch<E>(
        &self,
        application_id: &str,
        fetch: impl FnOnce() -> Result<MenuHierarchy, E>,
    ) -> Result<Arc<MenuHierarchy>, E> {
        if let Some(hierarchy) = self.hierarchies.get(application_id) {
            return Ok(hierarchy);
        }
        log::debug!("Fetching menu hierarchy for '{}'.", application_id);
        let hierarchy = fetch()?;
        self.hierarchies.put(application_id, hierarchy.clone());
        Ok(Arc::new(hierarchy))
    }

    /// Live cached hierarchy for `application_id`, if any.
    pub fn cache_get(&self, application_id: &str) -> Option<Arc<MenuHierarchy>> {
        self.hierarchies.get(application_id)
    }

    /// Caches `hierarchy` under `application_id`.
    pub fn cache_put(&self, application_id: &str, hierarchy: MenuHierarchy) {
        self.hierarchies.put(application_id, hierarchy);
    }

    /// Drops the cached hierarchy of `application_id`. Returns whether one was present.
    pub fn cache_invalidate(&self, application_id: &str) -> bool {
        self.hierarchies.invalidate(application_id)
    }

    /// Empties the hierarchy cache.
    pub fn cache_invalidate_all(&self) {
        self.hierarchies.invalidate_all();
    }

    /// Removes expired hierarchies and returns how many went.
    pub fn cache_cleanup(&self) -> usize {
        self.hierarchies.cleanup()
    }

    /// Current hierarchy cache counters.
    pub fn cache_stats(&self) -> CacheStatistics {
        self.hierarchies.statistics()
    }

    // --- Opaque ids ---

    /// Token standing for `element_path`.
    pub fn opaque_encode(&self, element_path: &str) -> String {
        self.ids.encode(element_path)
    }

    /// Path behind a token handed out by [`opaque_encode`](Self::opaque_encode).
    pub fn opaque_decode(&self, token: &str) -> Result<String, OpaqueIdError> {
        self.ids.decode(token)
    }

    /// Decodes `token` and resolves the path behind it against `root`.
    pub fn resolve_token<'t>(
        &self,
        token: &str,
        root: &'t UiElement,
    ) -> Result<Resolution<'t>, AddressingError> {
        let path = self.ids.decode(token)?;
        Ok(self.resolver.resolve_str(&path, root)?)
    }

    // --- Change detection ---

    /// Change set between two flattened snapshots.
    pub fn diff(&self, before: &Snapshot, after: &Snapshot) -> ChangeSet {
        change_detector::diff(before, after)
    }

    /// Diffs two trees whose paths have already been generated.
    pub fn diff_trees(&self, before: &UiElement, after: &UiElement) -> ChangeSet {
        self.diff(&path_generator::flatten(before), &path_generator::flatten(after))
    }
}
