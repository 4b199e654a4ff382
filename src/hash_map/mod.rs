//! Hashing and bucket directory for sparse storage
//!
//! - [`hash_functions`]: coordinate hasher with 1-D/2-D/3-D unrolled forms
//! - [`hash_directory`]: power-of-two chain-head table with in-place relinking

pub mod hash_directory;
pub mod hash_functions;

pub use hash_directory::{directory_size, HashDirectory};
pub use hash_functions::{hash1, hash2, hash3, hash_coords, hash_nd, HASH_SCALE};
