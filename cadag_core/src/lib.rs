//! # Cadag Core
//!
//! A content-addressed Merkle DAG over SHA-256.
//!
//! Files and directory hierarchies are imported into a backing key-value
//! store as immutable objects keyed by the hash of their canonical encoding.
//! Large files are split into fixed-size chunks arranged as a balanced tree;
//! directories link to their children by name. Any stored root can later be
//! walked by path and reconstructed byte for byte.
//!
//! ## Features
//!
//! - Deterministic keys: identical content yields identical keys
//! - Automatic deduplication of shared chunks and subtrees
//! - Pluggable backing store via [`ObjectStore`]
//! - On-disk store with atomic writes and zstd compression
//!
//! ## Example
//!
//! ```no_run
//! use cadag_core::{FileStore, MerkleDag, MemoryStore, Node};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // In-memory import of a single file
//! let memory = MemoryStore::new();
//! let dag = MerkleDag::new(&memory);
//! let key = dag.add(&Node::file("hello world"))?;
//! assert_eq!(dag.hash_to_file(&key, "")?, b"hello world");
//!
//! // On-disk import of a directory, then read one file back
//! let store = FileStore::init("./my-store")?;
//! let dag = MerkleDag::new(&store);
//! let root = dag.add_path(Path::new("./my-data"))?;
//! let bytes = dag.hash_to_file(&root, "docs/readme.txt")?;
//! println!("{} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

mod backend;
mod chunking;
mod config;
mod dag;
mod directory;
mod error;
mod hash;
mod memory;
mod node;
mod object;
mod resolve;
mod store;
mod tree;
mod walk;

pub use backend::ObjectStore;
pub use chunking::{BRANCHING_FACTOR, CHUNK_SIZE, chunk_count, compute_height, split};
pub use config::DagConfig;
pub use dag::MerkleDag;
pub use error::{Error, Result};
pub use hash::{Algorithm, Hash};
pub use memory::MemoryStore;
pub use node::{DirNode, FileNode, Node};
pub use object::{Link, Object, ObjectKind, validate_name};
pub use store::{CompressionType, FileStore};
