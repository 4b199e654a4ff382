//! Matrix containers
//!
//! ## Sparse storage
//!
//! - **`SparseMat`** - Reference-counted handle to an N-dimensional sparse matrix
//! - **`SparseHeader`** - Hash directory plus node pool shared by handles
//! - **`SparseIter`** / **`SparseNode`** - Single-pass traversal of stored elements
//!
//! ## Dense interop
//!
//! - **`DenseTarget`** - What a sparse matrix needs from a dense destination
//! - **`DenseMat`** - Row-major dense matrix implementing `DenseTarget`

pub mod dense_mat;
pub mod sparse_header;
pub mod sparse_iter;
pub mod sparse_mat;

pub use dense_mat::{DenseMat, DenseTarget};
pub use sparse_header::{SparseHeader, SparseShape, SparseStats, MAX_DIM};
pub use sparse_iter::{SparseIter, SparseNode};
pub use sparse_mat::SparseMat;
