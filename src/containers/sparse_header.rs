//! Shared storage behind a sparse matrix handle
//!
//! A [`SparseHeader`] owns the hash directory and the node pool for one logical
//! sparse matrix. Its [`SparseShape`] (dimension count, extents, element type)
//! is fixed for the header's lifetime; re-shaping a handle allocates a new
//! header.

use super::sparse_iter::SparseIter;
use crate::config::SparseMatConfig;
use crate::elem::ElemType;
use crate::error::{Result, SparseError};
use crate::hash_map::HashDirectory;
use crate::memory::{NodeLayout, NodePool};

/// Maximum number of dimensions of a sparse matrix
pub const MAX_DIM: usize = 32;

/// Dimension count, extents and element type of a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SparseShape {
    dims: usize,
    size: [i32; MAX_DIM],
    elem_type: ElemType,
}

impl SparseShape {
    /// Validate and build a shape
    ///
    /// Requires `1 <= sizes.len() <= MAX_DIM`, every extent positive and a valid
    /// channel count.
    pub fn new(sizes: &[i32], elem_type: ElemType) -> Result<Self> {
        let dims = sizes.len();
        if dims == 0 || dims > MAX_DIM {
            return Err(SparseError::invalid_dims(dims, format!("1..={}", MAX_DIM)));
        }
        if let Some((dim, &bad)) = sizes.iter().enumerate().find(|(_, &s)| s <= 0) {
            return Err(SparseError::invalid_size(dim, bad as i64));
        }
        elem_type.validate()?;

        let mut size = [0i32; MAX_DIM];
        size[..dims].copy_from_slice(sizes);
        Ok(Self { dims, size, elem_type })
    }

    /// Number of dimensions
    #[inline]
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Extents of the used dimensions
    #[inline]
    pub fn sizes(&self) -> &[i32] {
        &self.size[..self.dims]
    }

    /// Element type
    #[inline]
    pub fn elem_type(&self) -> ElemType {
        self.elem_type
    }

    /// True when `sizes` and `elem_type` describe this exact shape
    pub fn matches(&self, sizes: &[i32], elem_type: ElemType) -> bool {
        self.elem_type == elem_type && self.sizes() == sizes
    }
}

/// Occupancy figures of a sparse header
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseStats {
    /// Live nodes
    pub node_count: usize,
    /// Buckets in the hash directory
    pub hash_size: usize,
    /// `node_count / hash_size`
    pub load_factor: f64,
    /// Bytes of the node arena, including the reserved null slot
    pub pool_bytes: usize,
    /// Allocated slots not holding a live node
    pub free_slots: usize,
    /// Bytes per node record
    pub node_size: usize,
}

/// Hash directory plus node pool for one matrix
#[derive(Debug, Clone)]
pub struct SparseHeader {
    shape: SparseShape,
    config: SparseMatConfig,
    hashtab: HashDirectory,
    pool: NodePool,
}

impl SparseHeader {
    /// Create an empty header for `shape`
    ///
    /// Fails with `OutOfMemory` when the initial directory cannot be allocated.
    pub fn new(shape: SparseShape, config: SparseMatConfig) -> Result<Self> {
        let layout = NodeLayout::new(shape.dims, shape.elem_type);
        log::debug!(
            "Creating sparse header: dims={}, size={:?}, type={}, node_size={}",
            shape.dims,
            shape.sizes(),
            shape.elem_type,
            layout.node_size()
        );
        Ok(Self {
            shape,
            hashtab: HashDirectory::new(config.initial_hash_size)?,
            pool: NodePool::new(layout, config.min_pool_nodes),
            config,
        })
    }

    /// Drop every node and shrink the directory to its initial size
    pub fn clear(&mut self) {
        log::debug!(
            "Clearing sparse header: {} nodes, {} buckets",
            self.pool.node_count(),
            self.hashtab.len()
        );
        self.hashtab.reset();
        self.pool.clear();
    }

    /// Shape of the matrix
    #[inline]
    pub fn shape(&self) -> &SparseShape {
        &self.shape
    }

    /// Configuration the header was created with
    #[inline]
    pub fn config(&self) -> &SparseMatConfig {
        &self.config
    }

    /// Node record layout
    #[inline]
    pub fn layout(&self) -> &NodeLayout {
        self.pool.layout()
    }

    /// Number of stored elements
    #[inline]
    pub fn nz_count(&self) -> usize {
        self.pool.node_count()
    }

    /// Number of buckets in the directory
    #[inline]
    pub fn hash_size(&self) -> usize {
        self.hashtab.len()
    }

    #[inline]
    pub(crate) fn hashtab(&self) -> &HashDirectory {
        &self.hashtab
    }

    #[inline]
    pub(crate) fn pool(&self) -> &NodePool {
        &self.pool
    }

    /// Occupancy statistics
    pub fn stats(&self) -> SparseStats {
        let node_count = self.pool.node_count();
        let hash_size = self.hashtab.len();
        SparseStats {
            node_count,
            hash_size,
            load_factor: node_count as f64 / hash_size as f64,
            pool_bytes: self.pool.pool_bytes(),
            free_slots: self.pool.capacity() - node_count,
            node_size: self.layout().node_size(),
        }
    }

    /// Offset of the node holding `idx`, probing with the full hash `h`
    pub fn find_node(&self, idx: &[i32], h: u64) -> Option<usize> {
        let mut nidx = self.hashtab.head(self.hashtab.bucket_of(h));
        while nidx != 0 {
            if self.pool.hash(nidx) == h && self.pool.coords_eq(nidx, idx) {
                return Some(nidx);
            }
            nidx = self.pool.next(nidx);
        }
        None
    }

    /// Insert a zero-valued node for `idx` and return its offset
    ///
    /// The caller guarantees `idx` is not present yet. The directory doubles
    /// first when the new node would push the load past the fill factor.
    pub fn new_node(&mut self, idx: &[i32], h: u64) -> Result<usize> {
        let hsize = self.hashtab.len();
        if self.pool.node_count() + 1 > hsize.saturating_mul(self.config.max_fill_factor) {
            self.resize_hash_tab(hsize.saturating_mul(2))?;
        }

        let nidx = self.pool.allocate()?;
        self.pool.set_hash(nidx, h);
        let bucket = self.hashtab.bucket_of(h);
        self.pool.set_next(nidx, self.hashtab.head(bucket));
        self.hashtab.set_head(bucket, nidx);
        self.pool.write_coords(nidx, idx);
        self.pool.value_mut(nidx).fill(0);
        Ok(nidx)
    }

    /// Offset of the node holding `idx`, inserting a zero-valued one when absent
    pub fn find_or_insert(&mut self, idx: &[i32], h: u64) -> Result<usize> {
        match self.find_node(idx, h) {
            Some(nidx) => Ok(nidx),
            None => self.new_node(idx, h),
        }
    }

    /// Unlink `nidx` from `bucket`'s chain and return it to the pool
    fn remove_node(&mut self, bucket: usize, nidx: usize, previdx: usize) {
        let next = self.pool.next(nidx);
        if previdx != 0 {
            self.pool.set_next(previdx, next);
        } else {
            self.hashtab.set_head(bucket, next);
        }
        self.pool.release(nidx);
    }

    /// Remove the node holding `idx`; returns whether one was found
    pub fn erase(&mut self, idx: &[i32], h: u64) -> bool {
        let bucket = self.hashtab.bucket_of(h);
        let mut nidx = self.hashtab.head(bucket);
        let mut previdx = 0;
        while nidx != 0 {
            if self.pool.hash(nidx) == h && self.pool.coords_eq(nidx, idx) {
                self.remove_node(bucket, nidx, previdx);
                return true;
            }
            previdx = nidx;
            nidx = self.pool.next(nidx);
        }
        false
    }

    /// Rebuild the directory with at least `new_size` buckets
    pub fn resize_hash_tab(&mut self, new_size: usize) -> Result<()> {
        self.hashtab.resize(new_size, &mut self.pool)
    }

    /// Stored full hash of a node
    #[inline]
    pub fn node_hash(&self, nidx: usize) -> u64 {
        self.pool.hash(nidx)
    }

    /// Copy a node's coordinates into `out`
    #[inline]
    pub fn node_coords(&self, nidx: usize, out: &mut [i32]) {
        self.pool.read_coords(nidx, out)
    }

    /// Value bytes of a node
    #[inline]
    pub fn node_value(&self, nidx: usize) -> &[u8] {
        self.pool.value(nidx)
    }

    /// Mutable value bytes of a node
    #[inline]
    pub fn node_value_mut(&mut self, nidx: usize) -> &mut [u8] {
        self.pool.value_mut(nidx)
    }

    /// Forward pass over every live node
    pub fn iter(&self) -> SparseIter<'_> {
        SparseIter::new(self)
    }

    /// Visit the value of every live node mutably, in iteration order
    pub fn for_each_value_mut<F: FnMut(&mut [u8])>(&mut self, mut f: F) {
        let mut bucket = self.hashtab.next_occupied(0);
        while let Some(b) = bucket {
            let mut nidx = self.hashtab.head(b);
            while nidx != 0 {
                f(self.pool.value_mut(nidx));
                nidx = self.pool.next(nidx);
            }
            bucket = self.hashtab.next_occupied(b + 1);
        }
    }
}
