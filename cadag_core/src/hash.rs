//! Content keys using SHA-256.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hash digest size in bytes (SHA-256 produces 256-bit hashes).
pub const HASH_SIZE: usize = 32;

/// Supported hash algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// SHA-256 with 256-bit output.
    Sha256,
}

impl Algorithm {
    /// Returns the string representation of the algorithm (for config files).
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Sha256 => "sha2-256",
        }
    }

    /// Parse algorithm from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "sha2-256" => Ok(Algorithm::Sha256),
            _ => Err(Error::unsupported_algorithm(s)),
        }
    }

    /// Returns the algorithm ID byte (for object envelopes).
    pub fn id(&self) -> u8 {
        match self {
            Algorithm::Sha256 => 1,
        }
    }

    /// Parse algorithm from ID byte.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Algorithm::Sha256),
            _ => Err(Error::unsupported_algorithm(format!("ID {}", id))),
        }
    }
}

/// A 32-byte SHA-256 digest, used as the content key of every object.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    /// Create a Hash from raw bytes.
    pub fn from_bytes(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    /// Create a Hash from a hex string (64 hex characters).
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        if hex_str.len() != HASH_SIZE * 2 {
            return Err(Error::invalid_hash(format!(
                "Expected {} hex characters, got {}",
                HASH_SIZE * 2,
                hex_str.len()
            )));
        }

        let bytes =
            hex::decode(hex_str).map_err(|e| Error::invalid_hash(format!("Invalid hex: {}", e)))?;

        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&bytes);
        Ok(Hash(hash))
    }

    /// Convert to hex string (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Get the first 2 hex characters (for directory sharding).
    pub fn prefix(&self) -> String {
        hex::encode(&self.0[..1])
    }

    /// Get the remaining 62 hex characters (for filename).
    pub fn suffix(&self) -> String {
        hex::encode(&self.0[1..])
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Hash raw bytes using SHA-256.
    pub fn digest(data: &[u8]) -> Self {
        Hash(Sha256::digest(data).into())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex_str = String::deserialize(deserializer)?;
        Hash::from_hex(&hex_str).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_empty() {
        let hash = Hash::digest(b"");
        assert_eq!(
            hash.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_hello_world() {
        let hash = Hash::digest(b"hello world");

        // SHA-256 of "hello world"
        assert_eq!(
            hash.to_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_hash_from_hex_invalid_length() {
        assert!(Hash::from_hex("abcd").is_err());
        assert!(Hash::from_hex("").is_err());
    }

    #[test]
    fn test_hash_from_hex_invalid_chars() {
        let invalid = "z".repeat(64);
        assert!(Hash::from_hex(&invalid).is_err());
    }

    #[test]
    fn test_hash_prefix_suffix() {
        let hash = Hash::digest(b"test");
        assert_eq!(hash.prefix().len(), 2);
        assert_eq!(hash.suffix().len(), 62);
        assert_eq!(format!("{}{}", hash.prefix(), hash.suffix()), hash.to_hex());
    }

    #[test]
    fn test_hash_serde_as_hex() {
        let hash = Hash::digest(b"serde");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));

        let parsed: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, hash);

        assert!(serde_json::from_str::<Hash>("\"not-a-hash\"").is_err());
    }

    #[test]
    fn test_algorithm_conversions() {
        let algo = Algorithm::Sha256;
        assert_eq!(algo.as_str(), "sha2-256");
        assert_eq!(algo.id(), 1);

        assert_eq!(Algorithm::parse("sha2-256").unwrap(), Algorithm::Sha256);
        assert_eq!(Algorithm::from_id(1).unwrap(), Algorithm::Sha256);

        assert!(Algorithm::parse("blake3-256").is_err());
        assert!(Algorithm::from_id(99).is_err());
    }

    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            max_shrink_iters: 10000,
            ..ProptestConfig::default()
        })]

        /// Hashing the same data always produces the same key
        #[test]
        fn prop_hash_deterministic(data: Vec<u8>) {
            prop_assert_eq!(Hash::digest(&data), Hash::digest(&data));
        }

        /// Hex encoding is bijective
        #[test]
        fn prop_hex_roundtrip(bytes in prop::array::uniform32(any::<u8>())) {
            let hash = Hash::from_bytes(bytes);
            let parsed = Hash::from_hex(&hash.to_hex())?;
            prop_assert_eq!(hash, parsed);
        }

        /// Invalid hex length always fails
        #[test]
        fn prop_invalid_hex_length_fails(
            s in "[0-9a-f]{0,63}|[0-9a-f]{65,128}"
        ) {
            prop_assert!(Hash::from_hex(&s).is_err());
        }
    }
}
