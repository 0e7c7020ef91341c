//! Balanced chunk trees for large files.
//!
//! A file of `n` chunks is stored as a tree of height
//! [`compute_height`](crate::chunking::compute_height): leaves are blobs of at
//! most `chunk_size` bytes and every interior list node holds up to
//! `branching_factor` links in byte order. The last node on each level may
//! be short. Each node is written to the store as soon as it is complete, so
//! a parent is never persisted before its children.

use crate::backend::ObjectStore;
use crate::chunking::split;
use crate::config::DagConfig;
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::{Link, Object};
use rayon::ThreadPool;
use rayon::prelude::*;
use tracing::trace;

/// A persisted tree node and the number of file bytes below it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Built {
    /// The node itself.
    pub object: Object,
    /// Its content key.
    pub key: Hash,
    /// File bytes covered by this node.
    pub consumed: u64,
}

impl Built {
    fn link(&self) -> Link {
        Link::chunk(self.key, self.consumed)
    }
}

/// Builds and persists the chunk tree of one file.
pub(crate) struct TreeBuilder<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    data: &'a [u8],
    config: DagConfig,
    pool: Option<&'a ThreadPool>,
}

impl<'a, S: ObjectStore + ?Sized> TreeBuilder<'a, S> {
    /// Create a builder over `data`. `config` must already be validated.
    pub fn new(store: &'a S, data: &'a [u8], config: DagConfig) -> Self {
        Self {
            store,
            data,
            config,
            pool: None,
        }
    }

    /// Store sibling leaves on `pool`.
    pub fn with_pool(mut self, pool: Option<&'a ThreadPool>) -> Self {
        self.pool = pool;
        self
    }

    /// Build the subtree of the given height starting at byte `offset`.
    ///
    /// Height 0 is a single leaf blob. A node of height `h > 0` takes
    /// children of height `h - 1` until it holds `branching_factor` links or
    /// the input is exhausted.
    pub fn build(&self, height: u32, offset: usize) -> Result<Built> {
        if offset > self.data.len() {
            return Err(Error::malformed(format!(
                "Offset {} is past the end of {} input bytes",
                offset,
                self.data.len()
            )));
        }

        if height == 0 {
            let end = offset
                .saturating_add(self.config.chunk_size)
                .min(self.data.len());
            return self.leaf(&self.data[offset..end]);
        }

        let links = if height == 1 {
            let span = self
                .config
                .branching_factor
                .saturating_mul(self.config.chunk_size);
            let end = offset.saturating_add(span).min(self.data.len());
            self.leaves(&split(&self.data[offset..end], self.config.chunk_size))?
        } else {
            let mut links = Vec::new();
            let mut cursor = offset;
            loop {
                let child = self.build(height - 1, cursor)?;
                cursor += child.consumed as usize;
                links.push(child.link());
                if links.len() == self.config.branching_factor || cursor >= self.data.len() {
                    break;
                }
            }
            links
        };

        let consumed: u64 = links.iter().map(|l| l.size).sum();
        let object = Object::list(links)?;
        let key = self.store.put_object(&object)?;
        trace!(
            key = %key,
            height,
            links = object.links().len(),
            consumed,
            "stored list node"
        );

        Ok(Built {
            object,
            key,
            consumed,
        })
    }

    fn leaf(&self, chunk: &[u8]) -> Result<Built> {
        let object = Object::blob(chunk.to_vec());
        let key = self.store.put_object(&object)?;
        trace!(key = %key, size = chunk.len(), "stored leaf");
        Ok(Built {
            object,
            key,
            consumed: chunk.len() as u64,
        })
    }

    /// Store sibling leaves, on the worker pool when one is set.
    ///
    /// Links are collected by position, never by completion order.
    fn leaves(&self, chunks: &[&[u8]]) -> Result<Vec<Link>> {
        match self.pool {
            Some(pool) if chunks.len() > 1 => pool.install(|| {
                chunks
                    .par_iter()
                    .map(|chunk| self.leaf(chunk).map(|b| b.link()))
                    .collect()
            }),
            _ => chunks
                .iter()
                .map(|chunk| self.leaf(chunk).map(|b| b.link()))
                .collect(),
        }
    }
}
