//! # Sparsemat: N-Dimensional Sparse Matrix Storage
//!
//! This crate stores N-dimensional matrices where most elements are zero. Only
//! the stored elements take memory: each lives in a node of a chained hash
//! table keyed by its coordinate tuple.
//!
//! ## Key Features
//!
//! - **Up to 32 dimensions**: Coordinates are `i32` tuples of 1..=32 components
//! - **Typed elements over erased storage**: `u8`, `i8`, `u16`, `i16`, `i32`, `f32`, `f64`, 1 to 512 channels
//! - **Offset-addressed node pool**: Growth never invalidates a node; erased slots are recycled
//! - **Load-controlled rehashing**: Power-of-two directory doubling past a fill factor
//! - **Shared handles**: Cheap clones onto one reference-counted header
//! - **Saturating conversion**: Any depth to any depth with optional `alpha * v + beta` scaling
//! - **Dense interop**: Copy to and from row-major dense matrices
//! - **Reductions**: Norms, extrema with locations, normalization
//!
//! ## Quick Start
//!
//! ```rust
//! use sparsemat::{min_max_loc, norm, Depth, ElemType, NormType, SparseMat};
//!
//! let mut m = SparseMat::with_shape(&[1000, 1000], ElemType::scalar(Depth::F32))?;
//! m.set(&[5, 5], 1.0f32)?;
//! m.set(&[5, 6], 2.0f32)?;
//! m.set(&[999, 999], 3.0f32)?;
//!
//! assert_eq!(norm(&m, NormType::L1)?, 6.0);
//!
//! let mm = min_max_loc(&m)?;
//! assert_eq!(mm.min_loc, Some(vec![5, 5]));
//! assert_eq!(mm.max_loc, Some(vec![999, 999]));
//!
//! m.erase(&[5, 6], None)?;
//! assert_eq!(m.header()?.iter().count(), 2);
//!
//! // Convert to 8-bit with saturation
//! let mut bytes = SparseMat::new();
//! m.convert_to(&mut bytes, Some(Depth::U8), 100.0, 0.0)?;
//! assert_eq!(bytes.value::<u8>(&[999, 999])?, 255);
//! # Ok::<(), sparsemat::SparseError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod algorithms;
pub mod config;
pub mod containers;
pub mod elem;
pub mod error;
pub mod hash_map;
pub mod memory;

// Re-export core types
pub use containers::{
    DenseMat, DenseTarget, SparseHeader, SparseIter, SparseMat, SparseNode, SparseShape,
    SparseStats, MAX_DIM,
};
pub use elem::{Depth, DepthValue, ElemType, Element, CN_MAX};
pub use error::{Result, SparseError};

// Re-export configuration
pub use config::{Config, SparseMatConfig};

// Re-export reductions
pub use algorithms::{min_max_loc, norm, normalize, MinMaxLoc, NormType};

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version at debug level; safe to call more than once
pub fn init() {
    log::debug!("Initializing sparsemat v{}", VERSION);
}
