//! Bounty402 Artifacts - Content-addressed storage of agent result blobs
//!
//! A short hash goes on-chain instead of the full JSON payload; this store
//! serves the payload back by hash. Stores are constructed explicitly and
//! injected into request handlers so tests can use isolated instances.

use dashmap::DashMap;

/// Content-addressed blob store keyed by artifact hash
///
/// Hash keys are case-insensitive. `put` is idempotent by construction:
/// the hash is a function of the payload, so overwriting the same key
/// rewrites identical bytes.
pub trait ArtifactStore: Send + Sync {
    fn put(&self, hash: &str, payload: String);
    fn get(&self, hash: &str) -> Option<String>;
}

/// Process-lifetime in-memory store.
///
/// Unbounded and unpersisted; acceptable for the demo deployment only. A
/// production deployment swaps in a bounded persistent backing store via
/// the same trait.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    blobs: DashMap<String, String>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn put(&self, hash: &str, payload: String) {
        self.blobs.insert(hash.to_ascii_lowercase(), payload);
    }

    fn get(&self, hash: &str) -> Option<String> {
        self.blobs
            .get(&hash.to_ascii_lowercase())
            .map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let store = MemoryArtifactStore::new();
        store.put("0xABCDEF", r#"{"a":1}"#.to_string());
        assert_eq!(store.get("0xabcdef").as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(store.get("0xAbCdEf").as_deref(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn test_unknown_hash_is_none() {
        let store = MemoryArtifactStore::new();
        assert!(store.get("0xdeadbeef").is_none());
    }

    #[test]
    fn test_overwrite_is_silent() {
        let store = MemoryArtifactStore::new();
        store.put("0x01", "first".to_string());
        store.put("0x01", "second".to_string());
        assert_eq!(store.get("0x01").as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }
}
