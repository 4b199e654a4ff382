//! Configuration APIs for sparsemat
//!
//! Sparse containers take their tuning knobs (initial directory size, fill
//! factor, pool growth granularity, optional bounds checking) from a
//! [`SparseMatConfig`]. Every configuration type implements [`Config`], which
//! provides validation, environment initialization, presets and JSON
//! persistence.
//!
//! ```rust
//! use sparsemat::config::{Config, SparseMatConfig};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Defaults: 8 buckets, 3 nodes per bucket before rehash
//! let config = SparseMatConfig::default();
//! config.validate()?;
//!
//! // Initialize from environment variables with the SPARSEMAT_ prefix
//! let config = SparseMatConfig::from_env()?;
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use std::env;
use std::fmt;
use std::path::Path;

pub mod sparse;

#[cfg(test)]
mod tests;

pub use sparse::SparseMatConfig;

/// Common configuration trait providing validation, environment initialization,
/// and preset management functionality.
pub trait Config: Clone + fmt::Debug {
    /// Validate the configuration for correctness and consistency.
    fn validate(&self) -> Result<()>;

    /// Initialize configuration from environment variables.
    ///
    /// Environment variables use the format `SPARSEMAT_{FIELD}`, for example
    /// `SPARSEMAT_FILL_FACTOR=4`.
    fn from_env() -> Result<Self>
    where
        Self: Default,
    {
        Self::from_env_with_prefix("SPARSEMAT_")
    }

    /// Initialize configuration from environment variables with a custom prefix.
    fn from_env_with_prefix(prefix: &str) -> Result<Self>
    where
        Self: Default;

    /// Preset tuned for lookup throughput at the cost of memory.
    fn performance_preset() -> Self;

    /// Preset tuned for a small footprint.
    fn memory_preset() -> Self;

    /// Preset that front-loads allocation to keep per-insert latency flat.
    fn realtime_preset() -> Self;

    /// Balanced preset; the default configuration.
    fn balanced_preset() -> Self
    where
        Self: Default,
    {
        Self::default()
    }

    /// Save configuration to a JSON file.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()>;

    /// Load and validate configuration from a JSON file.
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self>;
}

/// Configuration validation error details.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// The field that failed validation
    pub field: String,
    /// The invalid value
    pub value: String,
    /// Description of why the value is invalid
    pub reason: String,
    /// Suggested valid values or ranges
    pub suggestion: Option<String>,
}

impl ValidationError {
    /// Create a new validation error.
    pub fn new(field: &str, value: &str, reason: &str) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
            suggestion: None,
        }
    }

    /// Add a suggestion for valid values.
    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid configuration for field '{}': value '{}' is invalid ({})",
            self.field, self.value, self.reason
        )?;

        if let Some(ref suggestion) = self.suggestion {
            write!(f, ". Suggested values: {}", suggestion)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Parse an environment variable, falling back to `default` when unset or malformed.
pub fn parse_env_var<T>(var_name: &str, default: T) -> T
where
    T: std::str::FromStr + Clone,
{
    env::var(var_name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Parse a boolean environment variable.
///
/// Accepts "true", "1", "yes", "on" (case-insensitive) as true, everything
/// else as false.
pub fn parse_env_bool(var_name: &str, default: bool) -> bool {
    env::var(var_name)
        .ok()
        .map(|s| {
            let s = s.to_lowercase();
            matches!(s.as_str(), "true" | "1" | "yes" | "on")
        })
        .unwrap_or(default)
}
