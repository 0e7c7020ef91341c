//! Directory-backed object store.
//!
//! Each object is written to `objects/{algorithm}/{prefix}/{suffix}` inside a
//! 16-byte envelope:
//!
//! ```text
//! 0x00  4   "MDOB" magic
//! 0x04  1   envelope version (u8) = 1
//! 0x05  1   algo: 1=sha2-256
//! 0x06  1   compression: 0=none, 1=zstd
//! 0x07  1   reserved (must be 0)
//! 0x08  8   payload_len (u64 LE) - stored (possibly compressed) size
//! 0x10  ... payload
//! ```
//!
//! The envelope is private to this store. Content keys are always computed
//! over the uncompressed canonical encoding.

use crate::backend::ObjectStore;
use crate::error::{Error, Result};
use crate::hash::{Algorithm, Hash};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Magic bytes at the start of every object file.
pub const ENVELOPE_MAGIC: &[u8; 4] = b"MDOB";

/// Current envelope version.
pub const ENVELOPE_VERSION: u8 = 1;

/// Size of the envelope header in bytes.
pub const ENVELOPE_SIZE: usize = 16;

/// Compression threshold: payloads >= 4KB are compressed.
const COMPRESSION_THRESHOLD: usize = 4096;

/// Compression applied to a stored payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    /// No compression.
    None = 0,
    /// Zstandard compression.
    Zstd = 1,
}

impl CompressionType {
    /// Convert to byte representation.
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Parse from byte representation.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Zstd),
            _ => Err(Error::compression_error(format!(
                "Invalid compression type: {}",
                value
            ))),
        }
    }
}

/// The fixed-size header in front of every object file.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Envelope {
    algorithm: Algorithm,
    compression: CompressionType,
    payload_len: u64,
}

impl Envelope {
    fn encode(&self) -> [u8; ENVELOPE_SIZE] {
        let mut buf = [0u8; ENVELOPE_SIZE];
        buf[0..4].copy_from_slice(ENVELOPE_MAGIC);
        buf[4] = ENVELOPE_VERSION;
        buf[5] = self.algorithm.id();
        buf[6] = self.compression.to_u8();
        buf[8..16].copy_from_slice(&self.payload_len.to_le_bytes());
        buf
    }

    fn decode(buf: &[u8], path: &Path) -> Result<Self> {
        if buf.len() < ENVELOPE_SIZE {
            return Err(Error::corrupted_object(
                path,
                format!(
                    "Envelope too short: {} bytes (expected {})",
                    buf.len(),
                    ENVELOPE_SIZE
                ),
            ));
        }

        if &buf[0..4] != ENVELOPE_MAGIC {
            return Err(Error::corrupted_object(
                path,
                format!(
                    "Invalid magic: expected {:?}, got {:?}",
                    ENVELOPE_MAGIC,
                    &buf[0..4]
                ),
            ));
        }

        if buf[4] != ENVELOPE_VERSION {
            return Err(Error::corrupted_object(
                path,
                format!("Unsupported envelope version: {}", buf[4]),
            ));
        }

        if buf[7] != 0 {
            return Err(Error::corrupted_object(
                path,
                format!("Reserved byte must be 0, got {}", buf[7]),
            ));
        }

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&buf[8..16]);

        Ok(Self {
            algorithm: Algorithm::from_id(buf[5])?,
            compression: CompressionType::from_u8(buf[6])?,
            payload_len: u64::from_le_bytes(len_bytes),
        })
    }
}

/// A content-addressed store on the local filesystem.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    algorithm: Algorithm,
}

impl FileStore {
    /// Initialize a new store at the given path.
    ///
    /// Creates the directory structure:
    /// - `objects/sha2-256/` for storing objects
    /// - `config` file with version and algorithm
    pub fn init<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let algorithm = Algorithm::Sha256;

        let objects_dir = root.join("objects").join(algorithm.as_str());
        fs::create_dir_all(&objects_dir)?;

        let config_path = root.join("config");
        let config_content = format!("version=1\nalgo={}\n", algorithm.as_str());
        fs::write(&config_path, config_content)?;

        debug!(root = %root.display(), "initialized file store");
        Ok(Self { root, algorithm })
    }

    /// Open an existing store at the given path.
    ///
    /// Validates the store structure and reads the configuration.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            return Err(Error::invalid_store(&root, "directory does not exist"));
        }

        let config_path = root.join("config");
        if !config_path.exists() {
            return Err(Error::invalid_store(&root, "config file not found"));
        }

        let config_content = fs::read_to_string(&config_path)?;
        let algorithm = Self::parse_config(&config_content)
            .map_err(|e| Error::invalid_store(&root, e.to_string()))?;

        let objects_dir = root.join("objects").join(algorithm.as_str());
        if !objects_dir.exists() {
            return Err(Error::invalid_store(
                &root,
                "objects directory structure missing",
            ));
        }

        Ok(Self { root, algorithm })
    }

    /// Parse the config file to extract the algorithm.
    fn parse_config(content: &str) -> Result<Algorithm> {
        let mut version = None;
        let mut algo = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                match key.trim() {
                    "version" => version = Some(value.trim()),
                    "algo" => algo = Some(value.trim()),
                    _ => {}
                }
            }
        }

        if version != Some("1") {
            return Err(Error::invalid_config(format!(
                "Unsupported config version: {:?}",
                version
            )));
        }

        let algo_str = algo.ok_or_else(|| Error::invalid_config("Missing algo in config"))?;
        Algorithm::parse(algo_str)
    }

    /// Get the path to an object file given its hash.
    ///
    /// Returns: `objects/{algorithm}/{prefix}/{suffix}`
    pub fn object_path(&self, hash: &Hash) -> PathBuf {
        self.root
            .join("objects")
            .join(self.algorithm.as_str())
            .join(hash.prefix())
            .join(hash.suffix())
    }

    /// Get the root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the algorithm used by this store.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Write an object atomically using tempfile.
    fn write_object_atomic(&self, hash: &Hash, envelope: &Envelope, payload: &[u8]) -> Result<()> {
        let obj_path = self.object_path(hash);
        let parent = obj_path
            .parent()
            .ok_or_else(|| Error::invalid_store(&self.root, "object path has no parent"))?;
        fs::create_dir_all(parent)?;

        let mut temp_file = tempfile::NamedTempFile::new_in(parent)?;
        temp_file.write_all(&envelope.encode())?;
        temp_file.write_all(payload)?;
        temp_file.flush()?;

        // Concurrent writers of the same key carry identical bytes
        temp_file.persist(&obj_path)?;

        Ok(())
    }
}

impl ObjectStore for FileStore {
    fn put(&self, key: &Hash, bytes: &[u8]) -> Result<()> {
        let obj_path = self.object_path(key);
        if obj_path.exists() {
            trace!(key = %key, "object already present");
            return Ok(());
        }

        let (payload, compression) = if bytes.len() >= COMPRESSION_THRESHOLD {
            (compress_zstd(bytes)?, CompressionType::Zstd)
        } else {
            (bytes.to_vec(), CompressionType::None)
        };

        let envelope = Envelope {
            algorithm: self.algorithm,
            compression,
            payload_len: payload.len() as u64,
        };

        self.write_object_atomic(key, &envelope, &payload)?;
        trace!(
            key = %key,
            size = bytes.len(),
            stored = payload.len(),
            "wrote object file"
        );
        Ok(())
    }

    fn get(&self, key: &Hash) -> Result<Option<Vec<u8>>> {
        let obj_path = self.object_path(key);
        let raw = match fs::read(&obj_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let envelope = Envelope::decode(&raw, &obj_path)?;
        let payload = &raw[ENVELOPE_SIZE..];
        if payload.len() as u64 != envelope.payload_len {
            return Err(Error::corrupted_object(
                &obj_path,
                format!(
                    "Payload length mismatch: expected {}, got {}",
                    envelope.payload_len,
                    payload.len()
                ),
            ));
        }

        let bytes = match envelope.compression {
            CompressionType::None => payload.to_vec(),
            CompressionType::Zstd => decompress_zstd(payload)?,
        };

        // Verify hash matches uncompressed bytes (corruption detection)
        let computed = Hash::digest(&bytes);
        if computed != *key {
            return Err(Error::corrupted_object(
                &obj_path,
                format!(
                    "Hash mismatch: expected {}, got {}",
                    key.to_hex(),
                    computed.to_hex()
                ),
            ));
        }

        Ok(Some(bytes))
    }

    fn contains(&self, key: &Hash) -> Result<bool> {
        Ok(self.object_path(key).exists())
    }
}

/// Compress data using zstd.
fn compress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::encode_all(data, 3) // Level 3 = fast compression
        .map_err(|e| Error::compression_error(format!("zstd compression failed: {}", e)))
}

/// Decompress data using zstd.
fn decompress_zstd(data: &[u8]) -> Result<Vec<u8>> {
    zstd::decode_all(data)
        .map_err(|e| Error::compression_error(format!("zstd decompression failed: {}", e)))
}
