//! Bucket directory over a node pool
//!
//! Each bucket holds the pool offset of the first node of its chain, 0 when
//! empty. The bucket count is always a power of two so a hash maps to a bucket
//! with a mask. Resizing relinks the existing nodes using their stored hashes;
//! node bytes never move.

use crate::config::sparse::MIN_HASH_SIZE;
use crate::error::{Result, SparseError};
use crate::memory::NodePool;

/// Round a requested bucket count to a valid directory size
///
/// Fails with `OutOfMemory` when no power of two that large fits in `usize`.
#[inline]
pub fn directory_size(requested: usize) -> Result<usize> {
    requested
        .max(MIN_HASH_SIZE)
        .checked_next_power_of_two()
        .ok_or_else(|| SparseError::out_of_memory(bucket_bytes(requested)))
}

#[inline]
fn bucket_bytes(buckets: usize) -> usize {
    buckets.saturating_mul(std::mem::size_of::<usize>())
}

fn alloc_buckets(size: usize) -> Result<Vec<usize>> {
    let mut buckets: Vec<usize> = Vec::new();
    buckets
        .try_reserve_exact(size)
        .map_err(|_| SparseError::out_of_memory(bucket_bytes(size)))?;
    buckets.resize(size, 0);
    Ok(buckets)
}

/// Power-of-two table of chain heads
#[derive(Debug, Clone)]
pub struct HashDirectory {
    buckets: Vec<usize>,
    initial: usize,
}

impl HashDirectory {
    /// Create an all-empty directory of at least `size` buckets
    pub fn new(size: usize) -> Result<Self> {
        let initial = directory_size(size)?;
        Ok(Self {
            buckets: alloc_buckets(initial)?,
            initial,
        })
    }

    /// Number of buckets
    #[inline]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Always false; a directory has at least 8 buckets
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Bucket index for a full hash
    #[inline]
    pub fn bucket_of(&self, hash: u64) -> usize {
        (hash & (self.buckets.len() as u64 - 1)) as usize
    }

    /// Head offset of a bucket's chain
    #[inline]
    pub fn head(&self, bucket: usize) -> usize {
        self.buckets[bucket]
    }

    /// Replace the head of a bucket's chain
    #[inline]
    pub fn set_head(&mut self, bucket: usize, offset: usize) {
        self.buckets[bucket] = offset;
    }

    /// First non-empty bucket at or after `from`
    pub fn next_occupied(&self, from: usize) -> Option<usize> {
        (from..self.buckets.len()).find(|&b| self.buckets[b] != 0)
    }

    /// Bucket count the directory was created with
    #[inline]
    pub fn initial_len(&self) -> usize {
        self.initial
    }

    /// Drop every chain and shrink back to the initial bucket count
    ///
    /// Never allocates: the directory only grows from its initial size.
    pub fn reset(&mut self) {
        self.buckets.truncate(self.initial);
        self.buckets.fill(0);
    }

    /// Rebuild the directory with `new_size` buckets (rounded up to a power of two)
    ///
    /// Every node keeps its stored hash; only chain membership changes.
    pub fn resize(&mut self, new_size: usize, pool: &mut NodePool) -> Result<()> {
        let new_size = directory_size(new_size)?;
        let mut new_buckets = alloc_buckets(new_size)?;

        let mask = new_size as u64 - 1;
        for &head in &self.buckets {
            let mut nidx = head;
            while nidx != 0 {
                let next = pool.next(nidx);
                let new_bucket = (pool.hash(nidx) & mask) as usize;
                pool.set_next(nidx, new_buckets[new_bucket]);
                new_buckets[new_bucket] = nidx;
                nidx = next;
            }
        }

        log::debug!(
            "Hash directory resized from {} to {} buckets ({} nodes)",
            self.buckets.len(),
            new_size,
            pool.node_count()
        );
        self.buckets = new_buckets;
        Ok(())
    }
}
