//! In-memory object store.

use crate::backend::ObjectStore;
use crate::error::Result;
use crate::hash::Hash;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::trace;

/// Object store backed by a `RwLock<HashMap>`.
///
/// Useful for tests and for embedding where persistence is not needed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<Hash, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryStore {
    fn put(&self, key: &Hash, bytes: &[u8]) -> Result<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        if map.contains_key(key) {
            trace!(key = %key, "object already present");
            return Ok(());
        }
        trace!(key = %key, size = bytes.len(), "storing object in memory");
        map.insert(*key, bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &Hash) -> Result<Option<Vec<u8>>> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.get(key).cloned())
    }

    fn contains(&self, key: &Hash) -> Result<bool> {
        let map = self.objects.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }
}
