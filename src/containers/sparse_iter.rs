//! Forward iteration over the nodes of a sparse header
//!
//! Order is bucket order then chain order: unspecified but stable while the
//! matrix is not modified.

use super::sparse_header::SparseHeader;
use crate::elem::Element;
use crate::error::{Result, SparseError};
use std::fmt;
use std::iter::FusedIterator;
use std::ptr;

/// Read-only view of one stored element
#[derive(Clone, Copy)]
pub struct SparseNode<'a> {
    hdr: &'a SparseHeader,
    offset: usize,
}

impl<'a> SparseNode<'a> {
    /// Pool offset of the node; stable until the node is erased
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Stored full hash of the coordinates
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hdr.node_hash(self.offset)
    }

    /// Coordinate along dimension `i`
    #[inline]
    pub fn idx(&self, i: usize) -> i32 {
        self.hdr.pool().coord(self.offset, i)
    }

    /// Copy the coordinates into `out`, which holds at least `dims` entries
    #[inline]
    pub fn read_coords(&self, out: &mut [i32]) {
        self.hdr.node_coords(self.offset, out)
    }

    /// Coordinates as an owned vector
    pub fn coords(&self) -> Vec<i32> {
        let mut out = vec![0; self.hdr.shape().dims()];
        self.read_coords(&mut out);
        out
    }

    /// Raw element bytes
    #[inline]
    pub fn value_bytes(&self) -> &'a [u8] {
        self.hdr.node_value(self.offset)
    }

    /// Element decoded as `T`, which must match the matrix element type
    pub fn value<T: Element>(&self) -> Result<T> {
        let ty = self.hdr.shape().elem_type();
        if T::elem_type() != ty {
            return Err(SparseError::type_mismatch(ty, T::elem_type()));
        }
        Ok(T::read_elem(self.value_bytes()))
    }
}

impl fmt::Debug for SparseNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseNode")
            .field("offset", &self.offset)
            .field("coords", &self.coords())
            .field("hash", &self.hash())
            .finish()
    }
}

/// Iterator over every node of a [`SparseHeader`]
#[derive(Clone)]
pub struct SparseIter<'a> {
    hdr: &'a SparseHeader,
    bucket: usize,
    node: usize,
}

impl<'a> SparseIter<'a> {
    pub(crate) fn new(hdr: &'a SparseHeader) -> Self {
        let dir = hdr.hashtab();
        match dir.next_occupied(0) {
            Some(bucket) => Self {
                hdr,
                bucket,
                node: dir.head(bucket),
            },
            None => Self::end(hdr),
        }
    }

    fn end(hdr: &'a SparseHeader) -> Self {
        Self {
            hdr,
            bucket: hdr.hash_size(),
            node: 0,
        }
    }

    /// True once every node has been yielded
    #[inline]
    pub fn is_end(&self) -> bool {
        self.node == 0
    }

    /// Node at the current position without advancing
    pub fn peek(&self) -> Option<SparseNode<'a>> {
        (self.node != 0).then_some(SparseNode {
            hdr: self.hdr,
            offset: self.node,
        })
    }

    fn advance(&mut self) {
        let next = self.hdr.pool().next(self.node);
        if next != 0 {
            self.node = next;
            return;
        }
        let dir = self.hdr.hashtab();
        match dir.next_occupied(self.bucket + 1) {
            Some(bucket) => {
                self.bucket = bucket;
                self.node = dir.head(bucket);
            }
            None => *self = Self::end(self.hdr),
        }
    }
}

impl<'a> Iterator for SparseIter<'a> {
    type Item = SparseNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.peek()?;
        self.advance();
        Some(current)
    }
}

impl FusedIterator for SparseIter<'_> {}

impl PartialEq for SparseIter<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.hdr, other.hdr) && self.node == other.node
    }
}

impl fmt::Debug for SparseIter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseIter")
            .field("bucket", &self.bucket)
            .field("node", &self.node)
            .finish()
    }
}
