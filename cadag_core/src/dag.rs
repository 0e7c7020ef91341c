//! Import entry point.

use crate::backend::ObjectStore;
use crate::chunking::{chunk_count, compute_height};
use crate::config::DagConfig;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::node::Node;
use crate::object::Object;
use crate::tree::TreeBuilder;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::path::Path;
use tracing::debug;

/// Key and logical size of a stored subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stored {
    pub key: Hash,
    pub size: u64,
}

/// A Merkle DAG over an explicitly supplied backing store.
///
/// The DAG borrows the store; besides its shape configuration it only owns
/// the worker pool used when `workers > 1`, so any number of DAG handles may
/// share one store.
#[derive(Debug)]
pub struct MerkleDag<'s, S: ObjectStore + ?Sized> {
    pub(crate) store: &'s S,
    pub(crate) config: DagConfig,
    pool: Option<ThreadPool>,
}

impl<'s, S: ObjectStore + ?Sized> MerkleDag<'s, S> {
    /// Create a DAG with the default chunk size and branching factor.
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            config: DagConfig::default(),
            pool: None,
        }
    }

    /// Create a DAG with a custom configuration.
    ///
    /// A pool of `config.workers` threads is started here and reused by
    /// every import through this handle.
    pub fn with_config(store: &'s S, config: DagConfig) -> Result<Self> {
        config.validate()?;

        let pool = if config.workers > 1 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(config.workers)
                .thread_name(|i| format!("cadag-worker-{}", i))
                .build()
                .map_err(|e| Error::invalid_config(format!("Cannot start worker pool: {}", e)))?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            store,
            config,
            pool,
        })
    }

    /// The backing store.
    pub fn store(&self) -> &'s S {
        self.store
    }

    /// The shape configuration.
    pub fn config(&self) -> &DagConfig {
        &self.config
    }

    /// Import a file or directory and return the content key of its root.
    ///
    /// The key depends only on the content and the chunk size / branching
    /// factor, so importing the same node twice yields the same key. If any
    /// write fails, no key is returned.
    pub fn add(&self, node: &Node) -> Result<Hash> {
        let stored = match node {
            Node::File(file) => self.store_file(file.bytes())?,
            Node::Directory(dir) => self.store_directory(dir)?,
        };
        debug!(key = %stored.key, size = stored.size, "imported node");
        Ok(stored.key)
    }

    /// Load a file or directory from the filesystem and import it.
    pub fn add_path(&self, path: &Path) -> Result<Hash> {
        let node = Node::from_path(path)?;
        self.add(&node)
    }

    /// Store file content as a single blob, or as a chunk tree when it
    /// exceeds one chunk.
    pub(crate) fn store_file(&self, bytes: &[u8]) -> Result<Stored> {
        let size = bytes.len() as u64;

        if bytes.len() <= self.config.chunk_size {
            let key = self.store.put_object(&Object::blob(bytes.to_vec()))?;
            return Ok(Stored { key, size });
        }

        let count = chunk_count(size, self.config.chunk_size);
        let height = compute_height(count, self.config.branching_factor);
        debug!(size, chunks = count, height, "building chunk tree");

        let built = TreeBuilder::new(self.store, bytes, self.config)
            .with_pool(self.pool.as_ref())
            .build(height, 0)?;
        Ok(Stored {
            key: built.key,
            size: built.consumed,
        })
    }
}
