// src/core/opaque_id.rs

//! # Opaque Element Identifiers
//!
//! External consumers never see raw element paths. Each path is handed out as a compact
//! token standing for a random 128-bit identifier, so a client can neither read the path
//! back out of a token nor forge a token for a path it was never given.
//!
//! The mapping is bidirectional and bounded; the least recently used pair is evicted when
//! the cache is full. A token that aged out simply stops resolving.

use crate::constants::DEFAULT_OPAQUE_ID_CAPACITY;
use crate::core::recency::RecencyList;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use uuid::Uuid;

/// Length of an encoded token: 16 bytes in unpadded base64.
pub const TOKEN_LENGTH: usize = 22;

/// Errors raised when turning a token back into a path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpaqueIdError {
    /// The token is not a well-formed encoding of a 128-bit identifier.
    #[error("Malformed element id '{0}'.")]
    InvalidToken(String),
    /// The token is well-formed but unknown, usually because it was evicted.
    #[error("Element id '{0}' is unknown or has expired.")]
    UnknownToken(String),
    /// The two directions of the mapping disagree. This is a bug, not a user error.
    #[error("Opaque id cache is inconsistent for id '{0}'.")]
    Corrupted(String),
}

/// A 128-bit identifier standing in for an element path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpaqueId(Uuid);

impl OpaqueId {
    fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// The raw 16 bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// The URL-safe, unpadded, fixed-length external form.
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0.as_bytes())
    }

    /// Exact inverse of [`encode`](Self::encode).
    pub fn decode(token: &str) -> Result<Self, OpaqueIdError> {
        let invalid = || OpaqueIdError::InvalidToken(token.to_string());
        if token.len() != TOKEN_LENGTH {
            return Err(invalid());
        }
        let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| invalid())?;
        let bytes: [u8; 16] = bytes.try_into().map_err(|_| invalid())?;
        Ok(Self(Uuid::from_bytes(bytes)))
    }
}

impl fmt::Display for OpaqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for OpaqueId {
    type Err = OpaqueIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

#[derive(Debug)]
struct IdState {
    path_to_id: HashMap<String, OpaqueId>,
    id_to_path: HashMap<OpaqueId, String>,
    recency: RecencyList<OpaqueId>,
}

impl IdState {
    fn evict_lru(&mut self) {
        if let Some(id) = self.recency.pop_lru() {
            if let Some(path) = self.id_to_path.remove(&id) {
                self.path_to_id.remove(&path);
                log::trace!("Evicted opaque id for '{}'.", path);
            }
        }
    }
}

/// Bounded bidirectional map between element paths and opaque identifiers.
#[derive(Debug)]
pub struct OpaqueIdCache {
    state: Mutex<IdState>,
    capacity: usize,
}

impl Default for OpaqueIdCache {
    fn default() -> Self {
        Self::new(DEFAULT_OPAQUE_ID_CAPACITY)
    }
}

impl OpaqueIdCache {
    /// Creates an empty cache. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(IdState {
                path_to_id: HashMap::new(),
                id_to_path: HashMap::new(),
                recency: RecencyList::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Maximum number of live pairs.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, IdState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the identifier for `path`, reusing the existing one while it is live.
    pub fn obtain_id(&self, path: &str) -> OpaqueId {
        let mut state = self.lock();

        if let Some(id) = state.path_to_id.get(path).copied() {
            state.recency.touch(&id);
            return id;
        }

        if state.path_to_id.len() >= self.capacity {
            state.evict_lru();
        }

        let mut id = OpaqueId::random();
        while state.id_to_path.contains_key(&id) {
            id = OpaqueId::random();
        }
        state.path_to_id.insert(path.to_string(), id);
        state.id_to_path.insert(id, path.to_string());
        state.recency.touch(&id);
        id
    }

    /// Encodes `path` as an external token.
    pub fn encode(&self, path: &str) -> String {
        self.obtain_id(path).encode()
    }

    /// Returns the path behind `id`, refreshing its recency.
    pub fn resolve_id(&self, id: OpaqueId) -> Result<String, OpaqueIdError> {
        let mut state = self.lock();
        let path = state
            .id_to_path
            .get(&id)
            .cloned()
            .ok_or_else(|| OpaqueIdError::UnknownToken(id.encode()))?;

        if state.path_to_id.get(&path) != Some(&id) {
            log::error!("Opaque id map out of sync for '{}'.", path);
            return Err(OpaqueIdError::Corrupted(id.encode()));
        }

        state.recency.touch(&id);
        Ok(path)
    }

    /// Decodes an external token back into its path.
    pub fn decode(&self, token: &str) -> Result<String, OpaqueIdError> {
        let id = OpaqueId::decode(token)?;
        self.resolve_id(id)
    }

    /// Forgets every pair. Tokens handed out so far stop resolving.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.path_to_id.clear();
        state.id_to_path.clear();
        state.recency.clear();
    }

    /// Number of live pairs.
    pub fn len(&self) -> usize {
        self.lock().path_to_id.len()
    }

    /// Whether no pair is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    const OK_BUTTON: &str = r#"macos://ui/AXApplication/AXWindow/AXButton[@AXTitle="OK"]"#;

    #[test]
    fn test_encode_decode_round_trip() {
        let cache = OpaqueIdCache::default();
        let token = cache.encode(OK_BUTTON);

        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(cache.decode(&token).unwrap(), OK_BUTTON);
    }

    #[test]
    fn test_same_path_same_token() {
        let cache = OpaqueIdCache::default();
        let first = cache.encode(OK_BUTTON);
        let second = cache.encode(OK_BUTTON);
        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_tokens_are_not_derived_from_paths() {
        let a = OpaqueIdCache::default().encode(OK_BUTTON);
        let b = OpaqueIdCache::default().encode(OK_BUTTON);
        assert_ne!(a, b);
    }

    #[test]
    fn test_decode_rejects_malformed_tokens() {
        let cache = OpaqueIdCache::default();
        for bad in ["", "short", "!!!!!!!!!!!!!!!!!!!!!!", "AAAAAAAAAAAAAAAAAAAAAAAA"] {
            assert!(matches!(cache.decode(bad), Err(OpaqueIdError::InvalidToken(_))), "{bad}");
        }
        // 22 chars whose last symbol carries bits beyond 128 is not a canonical encoding.
        assert!(cache.decode("AAAAAAAAAAAAAAAAAAAAA_").is_err());
    }

    #[test]
    fn test_unknown_token_is_not_found() {
        let cache = OpaqueIdCache::default();
        let foreign = OpaqueIdCache::default().encode(OK_BUTTON);
        assert_eq!(cache.decode(&foreign), Err(OpaqueIdError::UnknownToken(foreign.clone())));
    }

    #[test]
    fn test_lru_eviction() {
        let cache = OpaqueIdCache::new(2);
        let a = cache.encode("a");
        let b = cache.encode("b");
        // Refresh `a`, so `b` is the oldest.
        assert_eq!(cache.decode(&a).unwrap(), "a");
        let c = cache.encode("c");

        assert_eq!(cache.len(), 2);
        assert!(matches!(cache.decode(&b), Err(OpaqueIdError::UnknownToken(_))));
        assert_eq!(cache.decode(&a).unwrap(), "a");
        assert_eq!(cache.decode(&c).unwrap(), "c");

        // An evicted path gets a brand new token.
        assert_ne!(cache.encode("b"), b);
    }

    #[test]
    fn test_clear() {
        let cache = OpaqueIdCache::new(10);
        let token = cache.encode("x");
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.decode(&token).is_err());
    }

    /// Drops the path-to-id half of a pair, leaving the id-to-path half dangling.
    fn forget_forward_mapping(cache: &OpaqueIdCache, path: &str) {
        cache.lock().path_to_id.remove(path);
    }

    #[test]
    fn test_out_of_sync_maps_are_reported_as_corrupted() {
        // --- Setup ---
        let cache = OpaqueIdCache::default();
        let token = cache.encode(OK_BUTTON);
        forget_forward_mapping(&cache, OK_BUTTON);

        // --- Execute ---
        let result = cache.decode(&token);

        // --- Assert ---
        assert_eq!(result, Err(OpaqueIdError::Corrupted(token.clone())));

        // Re-encoding the path repairs the forward direction with a fresh id.
        let repaired = cache.encode(OK_BUTTON);
        assert_ne!(repaired, token);
        assert_eq!(cache.decode(&repaired).unwrap(), OK_BUTTON);
    }

    #[test]
    fn test_opaque_id_from_str() {
        let cache = OpaqueIdCache::default();
        let id = cache.obtain_id(OK_BUTTON);
        let parsed: OpaqueId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert_eq!(cache.resolve_id(parsed).unwrap(), OK_BUTTON);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_encoding_keeps_bijection() {
        let cache = Arc::new(OpaqueIdCache::new(64));
        let mut handles = Vec::new();
        for task in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                for i in 0..500 {
                    let path = format!("macos://ui/AXWindow/AXCell#{}", (task * 31 + i) % 100);
                    seen.push((path.clone(), cache.encode(&path)));
                }
                seen
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(cache.len() <= 64);
        // Every live token maps back to a distinct path and vice versa.
        let mut tokens = HashSet::new();
        for i in 0..100 {
            let path = format!("macos://ui/AXWindow/AXCell#{}", i);
            let token = cache.encode(&path);
            assert_eq!(cache.decode(&token).unwrap(), path);
            assert!(tokens.insert(token));
        }
    }
}
