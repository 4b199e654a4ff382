//! Memory management for sparse storage
//!
//! Node records live in a [`NodePool`]: one growable byte arena addressed by
//! offsets, with reclaimed slots threaded onto an embedded free list.

pub mod node_pool;

pub use node_pool::{align_size, NodeLayout, NodePool};
