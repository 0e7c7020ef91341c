//! Path resolution and content reconstruction.

use crate::backend::ObjectStore;
use crate::dag::MerkleDag;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::Object;
use tracing::debug;

impl<S: ObjectStore + ?Sized> MerkleDag<'_, S> {
    /// Fetch and decode the object stored under `key`.
    pub fn get_object(&self, key: &Hash) -> Result<Object> {
        self.store.get_object(key)
    }

    /// Walk `path` from the object at `root` and return the object it names.
    ///
    /// Segments are separated by `/`; empty segments are skipped, so `""`
    /// and `"/"` both name `root` itself.
    pub fn resolve(&self, root: &Hash, path: &str) -> Result<Object> {
        let mut object = self.store.get_object(root)?;

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if object.is_blob() {
                return Err(Error::path_not_found(path, segment));
            }
            let key = object
                .find_link(segment)
                .map(|link| link.hash)
                .ok_or_else(|| Error::path_not_found(path, segment))?;
            object = self.store.get_object(&key)?;
        }

        debug!(root = %root, path, kind = object.kind().as_str(), "resolved path");
        Ok(object)
    }

    /// Reconstruct the bytes imported at `path` below `root`.
    pub fn hash_to_file(&self, root: &Hash, path: &str) -> Result<Vec<u8>> {
        let object = self.resolve(root, path)?;
        self.materialize(object)
    }

    /// Concatenate the leaf data below `object`, depth-first and left to right.
    pub fn materialize(&self, object: Object) -> Result<Vec<u8>> {
        if object.is_blob() {
            return Ok(object.into_data());
        }

        let expected = object.logical_size();
        let mut out = Vec::new();
        let mut pending: Vec<Hash> = object.links().iter().rev().map(|l| l.hash).collect();

        while let Some(key) = pending.pop() {
            let child = self.store.get_object(&key)?;
            if child.is_blob() {
                let total = out.len() as u64 + child.data().len() as u64;
                if total > expected {
                    return Err(Error::malformed(format!(
                        "Materialized at least {} bytes, links declare {}",
                        total, expected
                    )));
                }
                out.extend_from_slice(child.data());
            } else {
                pending.extend(child.links().iter().rev().map(|l| l.hash));
            }
        }

        if out.len() as u64 != expected {
            return Err(Error::malformed(format!(
                "Materialized {} bytes, links declare {}",
                out.len(),
                expected
            )));
        }

        Ok(out)
    }
}
