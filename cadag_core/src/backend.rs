//! Backing store contract.

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::Object;

/// A key-value store holding encoded objects under their content keys.
///
/// Implementations must satisfy:
/// - `put` is idempotent: the same key always carries the same bytes, so a
///   second `put` for an existing key may be a no-op.
/// - Concurrent calls with distinct keys are safe.
/// - Errors are reported, never swallowed. Retries belong to the implementation.
pub trait ObjectStore: Send + Sync {
    /// Store encoded bytes under `key`.
    fn put(&self, key: &Hash, bytes: &[u8]) -> Result<()>;

    /// Fetch the bytes stored under `key`.
    ///
    /// Returns `Ok(None)` if the key is absent.
    fn get(&self, key: &Hash) -> Result<Option<Vec<u8>>>;

    /// Check whether `key` is present.
    fn contains(&self, key: &Hash) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Encode an object, store it under its content key, and return the key.
    ///
    /// Any error from `put` is reported as [`Error::StoreFailure`].
    fn put_object(&self, object: &Object) -> Result<Hash> {
        let bytes = object.encode();
        let key = Hash::digest(&bytes);
        self.put(&key, &bytes)
            .map_err(|e| Error::store_failure(key.to_hex(), e))?;
        Ok(key)
    }

    /// Fetch and decode the object stored under `key`.
    fn get_object(&self, key: &Hash) -> Result<Object> {
        let bytes = self
            .get(key)?
            .ok_or_else(|| Error::not_found(key.to_hex()))?;
        Object::decode(&bytes)
    }
}
