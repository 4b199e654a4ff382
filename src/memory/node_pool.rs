//! Offset-addressed node pool
//!
//! Nodes are fixed-size records carved out of one growable byte buffer and
//! addressed by their byte offset, so growing (and reallocating) the buffer
//! never invalidates a node reference held by a bucket chain or an iterator.
//!
//! # Record layout
//!
//! ```text
//! +0              hash    u64   full coordinate hash
//! +8              next    u64   offset of the next node in the chain, 0 = end
//! +16             coord   i32 x dims
//! +value_offset   value   elem_size bytes, aligned to the channel size
//! ```
//!
//! Offset 0 is the null node; the first slot always starts at `node_size`.
//! Free slots are threaded through their `next` field.

use crate::elem::ElemType;
use crate::error::{Result, SparseError};
use std::mem::size_of;

/// Byte offset of the stored hash
pub const HASH_FIELD: usize = 0;
/// Byte offset of the chain link
pub const NEXT_FIELD: usize = HASH_FIELD + size_of::<u64>();
/// Byte offset of the first coordinate
pub const COORD_FIELD: usize = NEXT_FIELD + size_of::<u64>();

const COORD_SIZE: usize = size_of::<i32>();
const RECORD_ALIGN: usize = size_of::<u64>();

/// Round `size` up to a multiple of the power of two `align`
#[inline]
pub const fn align_size(size: usize, align: usize) -> usize {
    (size + align - 1) & !(align - 1)
}

/// Byte layout of one node record for a given shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout {
    dims: usize,
    value_offset: usize,
    elem_size: usize,
    node_size: usize,
}

impl NodeLayout {
    /// Compute the layout for `dims` coordinates and elements of type `ty`
    pub fn new(dims: usize, ty: ElemType) -> Self {
        let value_offset = align_size(COORD_FIELD + dims * COORD_SIZE, ty.elem_size1());
        let node_size = align_size(value_offset + ty.elem_size(), RECORD_ALIGN);
        Self {
            dims,
            value_offset,
            elem_size: ty.elem_size(),
            node_size,
        }
    }

    /// Number of coordinates per node
    #[inline]
    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Offset of the value region within a record
    #[inline]
    pub fn value_offset(&self) -> usize {
        self.value_offset
    }

    /// Byte size of the value region
    #[inline]
    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    /// Total record size, a multiple of 8
    #[inline]
    pub fn node_size(&self) -> usize {
        self.node_size
    }
}

/// Growable arena of node records with an embedded free list
#[derive(Debug, Clone)]
pub struct NodePool {
    layout: NodeLayout,
    data: Vec<u8>,
    free_list: usize,
    node_count: usize,
    min_grow_nodes: usize,
}

impl NodePool {
    /// Create an empty pool; only the null slot is reserved
    pub fn new(layout: NodeLayout, min_grow_nodes: usize) -> Self {
        Self {
            layout,
            data: vec![0; layout.node_size],
            free_list: 0,
            node_count: 0,
            min_grow_nodes: min_grow_nodes.max(1),
        }
    }

    /// Record layout used by this pool
    #[inline]
    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    /// Number of live nodes
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Bytes currently occupied by the arena, null slot included
    #[inline]
    pub fn pool_bytes(&self) -> usize {
        self.data.len()
    }

    /// Number of usable slots, live or free
    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.len() / self.layout.node_size - 1
    }

    /// Forget every node. Backing storage is kept.
    pub fn clear(&mut self) {
        self.data.clear();
        self.data.resize(self.layout.node_size, 0);
        self.free_list = 0;
        self.node_count = 0;
    }

    /// Take a slot off the free list, growing the arena when it is empty
    ///
    /// The returned slot's contents are unspecified; the caller initializes it.
    pub fn allocate(&mut self) -> Result<usize> {
        if self.free_list == 0 {
            self.grow()?;
        }
        let offset = self.free_list;
        self.free_list = self.next(offset);
        self.node_count += 1;
        Ok(offset)
    }

    /// Push a slot back onto the free list
    pub fn release(&mut self, offset: usize) {
        debug_assert!(self.is_slot(offset));
        self.set_next(offset, self.free_list);
        self.free_list = offset;
        self.node_count -= 1;
    }

    fn grow(&mut self) -> Result<()> {
        let nsz = self.layout.node_size;
        let psize = self.data.len();
        let target = (psize / 2)
            .saturating_mul(3)
            .max(self.min_grow_nodes.saturating_mul(nsz));
        // Always at least one new slot
        let new_psize = (target / nsz * nsz).max(psize.saturating_add(nsz));

        // Reserve before touching any state
        self.data
            .try_reserve_exact(new_psize - psize)
            .map_err(|_| SparseError::out_of_memory(new_psize - psize))?;
        self.data.resize(new_psize, 0);

        let first = psize.max(nsz);
        let last = new_psize - nsz;
        for offset in (first..last).step_by(nsz) {
            self.set_next(offset, offset + nsz);
        }
        self.set_next(last, 0);
        self.free_list = first;

        log::debug!(
            "Node pool grew from {} to {} bytes ({} slots of {} bytes)",
            psize,
            new_psize,
            new_psize / nsz - 1,
            nsz
        );
        Ok(())
    }

    #[inline]
    fn is_slot(&self, offset: usize) -> bool {
        offset != 0 && offset % self.layout.node_size == 0 && offset < self.data.len()
    }

    #[inline]
    fn read_u64(&self, at: usize) -> u64 {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.data[at..at + 8]);
        u64::from_ne_bytes(buf)
    }

    #[inline]
    fn write_u64(&mut self, at: usize, v: u64) {
        self.data[at..at + 8].copy_from_slice(&v.to_ne_bytes());
    }

    /// Stored full hash of a node
    #[inline]
    pub fn hash(&self, offset: usize) -> u64 {
        self.read_u64(offset + HASH_FIELD)
    }

    /// Store the full hash of a node
    #[inline]
    pub fn set_hash(&mut self, offset: usize, hash: u64) {
        self.write_u64(offset + HASH_FIELD, hash)
    }

    /// Chain successor of a node, 0 at the end
    #[inline]
    pub fn next(&self, offset: usize) -> usize {
        self.read_u64(offset + NEXT_FIELD) as usize
    }

    /// Set the chain successor of a node
    #[inline]
    pub fn set_next(&mut self, offset: usize, next: usize) {
        self.write_u64(offset + NEXT_FIELD, next as u64)
    }

    /// The `i`-th coordinate of a node
    #[inline]
    pub fn coord(&self, offset: usize, i: usize) -> i32 {
        let at = offset + COORD_FIELD + i * COORD_SIZE;
        let mut buf = [0u8; COORD_SIZE];
        buf.copy_from_slice(&self.data[at..at + COORD_SIZE]);
        i32::from_ne_bytes(buf)
    }

    /// Compare a node's coordinates against `idx`
    #[inline]
    pub fn coords_eq(&self, offset: usize, idx: &[i32]) -> bool {
        idx.iter().enumerate().all(|(i, &c)| self.coord(offset, i) == c)
    }

    /// Copy a node's coordinates into `out`
    pub fn read_coords(&self, offset: usize, out: &mut [i32]) {
        for (i, c) in out.iter_mut().enumerate().take(self.layout.dims) {
            *c = self.coord(offset, i);
        }
    }

    /// Store a node's coordinates
    pub fn write_coords(&mut self, offset: usize, idx: &[i32]) {
        let base = offset + COORD_FIELD;
        for (i, c) in idx.iter().enumerate().take(self.layout.dims) {
            let at = base + i * COORD_SIZE;
            self.data[at..at + COORD_SIZE].copy_from_slice(&c.to_ne_bytes());
        }
    }

    /// Value region of a node
    #[inline]
    pub fn value(&self, offset: usize) -> &[u8] {
        let at = offset + self.layout.value_offset;
        &self.data[at..at + self.layout.elem_size]
    }

    /// Mutable value region of a node
    #[inline]
    pub fn value_mut(&mut self, offset: usize) -> &mut [u8] {
        let at = offset + self.layout.value_offset;
        &mut self.data[at..at + self.layout.elem_size]
    }
}
