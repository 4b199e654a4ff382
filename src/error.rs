//! Error handling for the sparsemat library
//!
//! Every fallible operation returns [`Result`]. Absence of an element is not an
//! error and is reported as `Ok(None)` by the lookup functions; the variants here
//! cover contract violations, unsupported element kinds and allocation failures.

use thiserror::Error;

/// Main error type for the sparsemat library
#[derive(Error, Debug)]
pub enum SparseError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid data format or corruption
    #[error("Invalid data: {message}")]
    InvalidData {
        /// Error message describing the issue
        message: String,
    },

    /// Dimension count outside `1..=MAX_DIM` or not matching the container
    #[error("Invalid dimensions: got {dims}, expected {expected}")]
    InvalidDimensions {
        /// Dimension count that was supplied
        dims: usize,
        /// Description of the accepted dimension count
        expected: String,
    },

    /// Non-positive extent along one dimension
    #[error("Invalid size: dimension {dim} has extent {size}")]
    InvalidSize {
        /// Dimension index
        dim: usize,
        /// Rejected extent
        size: i64,
    },

    /// Index out of bounds access
    #[error("Out of bounds: index {index}, size {size}")]
    OutOfBounds {
        /// The invalid index
        index: i64,
        /// The valid size/length
        size: i64,
    },

    /// Memory allocation failures
    #[error("Memory allocation failed: requested {size} bytes")]
    OutOfMemory {
        /// Number of bytes requested
        size: usize,
    },

    /// Feature not supported or not implemented
    #[error("Not supported: {feature}")]
    NotSupported {
        /// Description of the unsupported feature
        feature: String,
    },

    /// Typed access with an element type different from the container's
    #[error("Type mismatch: container holds {expected}, accessed as {actual}")]
    TypeMismatch {
        /// Element type of the container
        expected: String,
        /// Element type requested by the caller
        actual: String,
    },

    /// Operation on a handle without a header
    #[error("Sparse matrix is not initialized")]
    Uninitialized,

    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },

    /// Resource already in use or locked
    #[error("Resource busy: {resource}")]
    ResourceBusy {
        /// Description of the busy resource
        resource: String,
    },
}

impl SparseError {
    /// Create an invalid data error
    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        Self::InvalidData { message: message.into() }
    }

    /// Create an invalid dimensions error
    pub fn invalid_dims<S: Into<String>>(dims: usize, expected: S) -> Self {
        Self::InvalidDimensions { dims, expected: expected.into() }
    }

    /// Create an invalid size error
    pub fn invalid_size(dim: usize, size: i64) -> Self {
        Self::InvalidSize { dim, size }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds(index: i64, size: i64) -> Self {
        Self::OutOfBounds { index, size }
    }

    /// Create an out of memory error
    pub fn out_of_memory(size: usize) -> Self {
        Self::OutOfMemory { size }
    }

    /// Create a not supported error
    pub fn not_supported<S: Into<String>>(feature: S) -> Self {
        Self::NotSupported { feature: feature.into() }
    }

    /// Create a type mismatch error
    pub fn type_mismatch<A: ToString, B: ToString>(expected: A, actual: B) -> Self {
        Self::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into() }
    }

    /// Create a resource busy error
    pub fn resource_busy<S: Into<String>>(resource: S) -> Self {
        Self::ResourceBusy { resource: resource.into() }
    }

    /// Check if this is a recoverable error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::OutOfMemory { .. } => true,
            Self::ResourceBusy { .. } => true,
            Self::InvalidData { .. } => false,
            Self::InvalidDimensions { .. } => false,
            Self::InvalidSize { .. } => false,
            Self::OutOfBounds { .. } => false,
            Self::NotSupported { .. } => false,
            Self::TypeMismatch { .. } => false,
            Self::Uninitialized => false,
            Self::Configuration { .. } => false,
        }
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::InvalidData { .. } => "data",
            Self::InvalidDimensions { .. } => "dims",
            Self::InvalidSize { .. } => "size",
            Self::OutOfBounds { .. } => "bounds",
            Self::OutOfMemory { .. } => "memory",
            Self::NotSupported { .. } => "unsupported",
            Self::TypeMismatch { .. } => "type",
            Self::Uninitialized => "uninitialized",
            Self::Configuration { .. } => "config",
            Self::ResourceBusy { .. } => "resource",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SparseError>;

/// Assert that a coordinate component lies in `[0, size)`
#[inline]
pub fn check_bounds(index: i32, size: i32) -> Result<()> {
    if index < 0 || index >= size {
        Err(SparseError::out_of_bounds(index as i64, size as i64))
    } else {
        Ok(())
    }
}

/// Assert that a coordinate tuple has the arity of the container
#[inline]
pub fn check_dims(actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        Err(SparseError::invalid_dims(actual, expected.to_string()))
    } else {
        Ok(())
    }
}
