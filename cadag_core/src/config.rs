//! DAG shape configuration.

use crate::chunking::{BRANCHING_FACTOR, CHUNK_SIZE};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Parameters that determine the shape of imported DAGs.
///
/// `chunk_size` and `branching_factor` are part of a digest's identity:
/// importing the same bytes with different values yields different keys.
/// `workers` only affects throughput.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagConfig {
    /// Maximum bytes per leaf blob.
    pub chunk_size: usize,
    /// Maximum links per list node.
    pub branching_factor: usize,
    /// Number of threads used to store sibling leaves.
    pub workers: usize,
}

impl Default for DagConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            branching_factor: BRANCHING_FACTOR,
            workers: 1,
        }
    }
}

impl DagConfig {
    /// Set the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the branching factor.
    pub fn with_branching_factor(mut self, branching_factor: usize) -> Self {
        self.branching_factor = branching_factor;
        self
    }

    /// Set the number of worker threads.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Check that the configuration can build a tree.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::invalid_config("chunk_size must be at least 1"));
        }
        if self.branching_factor < 2 {
            return Err(Error::invalid_config(format!(
                "branching_factor must be at least 2, got {}",
                self.branching_factor
            )));
        }
        if self.workers == 0 {
            return Err(Error::invalid_config("workers must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = DagConfig::default();
        assert_eq!(config.chunk_size, 262144);
        assert_eq!(config.branching_factor, 4096);
        assert_eq!(config.workers, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_degenerate_shapes() {
        assert!(DagConfig::default().with_chunk_size(0).validate().is_err());
        assert!(
            DagConfig::default()
                .with_branching_factor(1)
                .validate()
                .is_err()
        );
        assert!(DagConfig::default().with_workers(0).validate().is_err());
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: DagConfig = serde_json::from_str(r#"{"workers": 4}"#).unwrap();
        assert_eq!(config, DagConfig::default().with_workers(4));
    }

    #[test]
    fn test_serialize_roundtrip() {
        let config = DagConfig::default()
            .with_chunk_size(1024)
            .with_branching_factor(8);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: DagConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
