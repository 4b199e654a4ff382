//! Algorithms over sparse matrices
//!
//! - [`sparse_ops`]: norms, extrema with locations, normalization

pub mod sparse_ops;

pub use sparse_ops::{min_max_loc, norm, normalize, MinMaxLoc, NormType};
