//! Sparse container configuration.

use super::{parse_env_bool, parse_env_var, Config, ValidationError};
use crate::error::{Result, SparseError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Smallest hash directory the containers will use
pub const MIN_HASH_SIZE: usize = 8;

/// Largest accepted initial directory size
pub const MAX_INITIAL_HASH_SIZE: usize = 1 << 24;

/// Nodes per bucket tolerated before the directory doubles
pub const DEFAULT_FILL_FACTOR: usize = 3;

/// Largest accepted fill factor
pub const MAX_FILL_FACTOR: usize = 1 << 16;

/// Arena size, in node records, after the first pool growth
pub const DEFAULT_MIN_POOL_NODES: usize = 8;

/// Largest accepted pool growth granularity
pub const MAX_POOL_NODES: usize = 1 << 24;

/// Tuning for sparse matrix storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseMatConfig {
    /// Bucket count of a fresh or cleared directory; power of two in `8..=2^24`
    pub initial_hash_size: usize,
    /// Maximum average chain length before the directory doubles, `1..=2^16`
    pub max_fill_factor: usize,
    /// Lower bound on the arena size in node records after a growth, `1..=2^24`.
    /// Every growth adds at least one slot.
    pub min_pool_nodes: usize,
    /// Reject coordinates outside `[0, size[i])` on element access
    pub bounds_check: bool,
}

impl Default for SparseMatConfig {
    fn default() -> Self {
        Self {
            initial_hash_size: MIN_HASH_SIZE,
            max_fill_factor: DEFAULT_FILL_FACTOR,
            min_pool_nodes: DEFAULT_MIN_POOL_NODES,
            bounds_check: false,
        }
    }
}

impl SparseMatConfig {
    /// Builder-style override of the initial directory size
    pub fn with_initial_hash_size(mut self, size: usize) -> Self {
        self.initial_hash_size = size;
        self
    }

    /// Builder-style override of the fill factor
    pub fn with_max_fill_factor(mut self, fill: usize) -> Self {
        self.max_fill_factor = fill;
        self
    }

    /// Builder-style override of the pool growth granularity
    pub fn with_min_pool_nodes(mut self, nodes: usize) -> Self {
        self.min_pool_nodes = nodes;
        self
    }

    /// Builder-style toggle for coordinate bounds checking
    pub fn with_bounds_check(mut self, enabled: bool) -> Self {
        self.bounds_check = enabled;
        self
    }
}

impl Config for SparseMatConfig {
    fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.initial_hash_size < MIN_HASH_SIZE
            || self.initial_hash_size > MAX_INITIAL_HASH_SIZE
            || !self.initial_hash_size.is_power_of_two()
        {
            errors.push(
                ValidationError::new(
                    "initial_hash_size",
                    &self.initial_hash_size.to_string(),
                    "directory size must be a power of two between 8 and 2^24",
                )
                .with_suggestion("8, 64, 256"),
            );
        }

        if self.max_fill_factor == 0 || self.max_fill_factor > MAX_FILL_FACTOR {
            errors.push(
                ValidationError::new(
                    "max_fill_factor",
                    &self.max_fill_factor.to_string(),
                    "fill factor must be between 1 and 2^16",
                )
                .with_suggestion("3"),
            );
        }

        if self.min_pool_nodes == 0 || self.min_pool_nodes > MAX_POOL_NODES {
            errors.push(ValidationError::new(
                "min_pool_nodes",
                &self.min_pool_nodes.to_string(),
                "pool growth granularity must be between 1 and 2^24 nodes",
            ));
        }

        if !errors.is_empty() {
            return Err(SparseError::configuration(format!(
                "Sparse matrix configuration validation failed: {}",
                errors
                    .into_iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            )));
        }

        Ok(())
    }

    fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let mut config = Self::default();
        config.initial_hash_size =
            parse_env_var(&format!("{}HASH_SIZE", prefix), config.initial_hash_size);
        config.max_fill_factor =
            parse_env_var(&format!("{}FILL_FACTOR", prefix), config.max_fill_factor);
        config.min_pool_nodes =
            parse_env_var(&format!("{}MIN_POOL_NODES", prefix), config.min_pool_nodes);
        config.bounds_check =
            parse_env_bool(&format!("{}BOUNDS_CHECK", prefix), config.bounds_check);
        if let Err(e) = config.validate() {
            log::warn!("Rejected sparse matrix configuration from environment: {}", e);
            return Err(e);
        }
        Ok(config)
    }

    fn performance_preset() -> Self {
        Self {
            initial_hash_size: 64,
            max_fill_factor: 2,
            min_pool_nodes: 64,
            bounds_check: false,
        }
    }

    fn memory_preset() -> Self {
        Self {
            initial_hash_size: MIN_HASH_SIZE,
            max_fill_factor: 4,
            min_pool_nodes: 2,
            bounds_check: false,
        }
    }

    fn realtime_preset() -> Self {
        Self {
            initial_hash_size: 256,
            max_fill_factor: DEFAULT_FILL_FACTOR,
            min_pool_nodes: 1024,
            bounds_check: false,
        }
    }

    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self).map_err(|e| {
            SparseError::configuration(format!("Failed to serialize sparse config: {}", e))
        })?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            SparseError::configuration(format!("Failed to parse sparse config file: {}", e))
        })?;
        if let Err(e) = config.validate() {
            log::warn!("Rejected sparse matrix configuration from file: {}", e);
            return Err(e);
        }
        Ok(config)
    }
}
