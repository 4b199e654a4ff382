//! N-dimensional sparse matrix handle
//!
//! [`SparseMat`] is a cheap, clonable handle onto a reference-counted
//! [`SparseHeader`]. Clones alias the same storage until an explicit
//! [`create`](SparseMat::create) on one of them allocates a fresh header.

use super::dense_mat::{DenseMat, DenseTarget};
use super::sparse_header::{SparseHeader, SparseShape, SparseStats, MAX_DIM};
use crate::config::{Config, SparseMatConfig};
use crate::elem::{
    get_convert_elem, get_convert_scale_elem, is_zero_elem, Depth, ElemType, Element,
};
use crate::error::{check_bounds, check_dims, Result, SparseError};
use crate::hash_map::hash_coords;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// Immutable shape next to the mutable storage it describes
///
/// `nz_count` and `hash_size` mirror the header and are refreshed whenever a
/// [`HeaderMut`] is released, so they stay readable while a `ptr` guard lives.
#[derive(Debug)]
struct SharedHeader {
    shape: SparseShape,
    bounds_check: bool,
    nz_count: Cell<usize>,
    hash_size: Cell<usize>,
    hdr: RefCell<SparseHeader>,
}

impl SharedHeader {
    fn new(shape: SparseShape, config: SparseMatConfig) -> Result<Self> {
        let bounds_check = config.bounds_check;
        let hdr = SparseHeader::new(shape, config)?;
        Ok(Self {
            shape,
            bounds_check,
            nz_count: Cell::new(hdr.nz_count()),
            hash_size: Cell::new(hdr.hash_size()),
            hdr: RefCell::new(hdr),
        })
    }

    fn borrow(&self) -> Result<Ref<'_, SparseHeader>> {
        self.hdr
            .try_borrow()
            .map_err(|_| SparseError::resource_busy("sparse matrix header"))
    }

    fn borrow_raw_mut(&self) -> Result<RefMut<'_, SparseHeader>> {
        self.hdr
            .try_borrow_mut()
            .map_err(|_| SparseError::resource_busy("sparse matrix header"))
    }

    fn borrow_mut(&self) -> Result<HeaderMut<'_>> {
        Ok(HeaderMut {
            owner: self,
            hdr: self.borrow_raw_mut()?,
        })
    }

    fn sync(&self, hdr: &SparseHeader) {
        self.nz_count.set(hdr.nz_count());
        self.hash_size.set(hdr.hash_size());
    }

    /// Fail when a stored coordinate lies outside the extents
    fn check_extents(&self, hdr: &SparseHeader) -> Result<()> {
        let dims = self.shape.dims();
        let mut idx = [0i32; MAX_DIM];
        for node in hdr.iter() {
            node.read_coords(&mut idx[..dims]);
            for (&i, &s) in idx[..dims].iter().zip(self.shape.sizes()) {
                check_bounds(i, s)?;
            }
        }
        Ok(())
    }

    fn check_index(&self, idx: &[i32]) -> Result<()> {
        check_dims(idx.len(), self.shape.dims())?;
        if self.bounds_check {
            for (&i, &s) in idx.iter().zip(self.shape.sizes()) {
                check_bounds(i, s)?;
            }
        }
        Ok(())
    }

    fn check_type<T: Element>(&self) -> Result<()> {
        let ty = self.shape.elem_type();
        if T::elem_type() != ty {
            return Err(SparseError::type_mismatch(ty, T::elem_type()));
        }
        Ok(())
    }
}

/// Exclusive header borrow; refreshes the cached counters on release
struct HeaderMut<'a> {
    owner: &'a SharedHeader,
    hdr: RefMut<'a, SparseHeader>,
}

impl Deref for HeaderMut<'_> {
    type Target = SparseHeader;

    fn deref(&self) -> &SparseHeader {
        &self.hdr
    }
}

impl DerefMut for HeaderMut<'_> {
    fn deref_mut(&mut self) -> &mut SparseHeader {
        &mut self.hdr
    }
}

impl Drop for HeaderMut<'_> {
    fn drop(&mut self) {
        self.owner.sync(&self.hdr);
    }
}

/// Sparse N-dimensional matrix
///
/// Maps coordinate tuples to fixed-size elements. Only stored elements occupy
/// memory; every other coordinate reads as zero. Storage is a chained hash
/// table whose nodes live in an offset-addressed pool, so growing the pool
/// never invalidates a node.
///
/// # Sharing
///
/// `Clone` produces another handle onto the same storage (a reference count
/// increment). Writes through one handle are visible through all of them.
/// Use [`deep_clone`](Self::deep_clone) for an independent copy.
///
/// # Performance Characteristics
///
/// - **Lookup / insert / erase**: O(1) amortized
/// - **Iteration, copy, conversion**: O(nodes + buckets)
/// - **Per node**: 16 bytes of hash and link plus 4 bytes per coordinate plus the element, 8-byte aligned
///
/// # Example
///
/// ```rust
/// use sparsemat::{Depth, ElemType, SparseMat};
///
/// let mut m = SparseMat::with_shape(&[1000, 1000], ElemType::scalar(Depth::F32))?;
/// m.set(&[5, 5], 1.0f32)?;
/// m.set(&[999, 999], 3.0f32)?;
///
/// assert_eq!(m.nz_count(), 2);
/// assert_eq!(m.value::<f32>(&[5, 5])?, 1.0);
/// assert_eq!(m.value::<f32>(&[0, 0])?, 0.0);
///
/// let total: f32 = m.header()?.iter().map(|n| n.value::<f32>().unwrap_or(0.0)).sum();
/// assert_eq!(total, 4.0);
/// # Ok::<(), sparsemat::SparseError>(())
/// ```
#[derive(Clone, Default)]
pub struct SparseMat {
    shared: Option<Rc<SharedHeader>>,
    config: SparseMatConfig,
}

impl SparseMat {
    /// Uninitialized handle with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Uninitialized handle carrying a validated configuration
    pub fn with_config(config: SparseMatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            shared: None,
            config,
        })
    }

    /// Empty matrix of the given shape
    pub fn with_shape(sizes: &[i32], elem_type: ElemType) -> Result<Self> {
        let mut m = Self::new();
        m.create(sizes, elem_type)?;
        Ok(m)
    }

    /// Sparse copy of a dense matrix holding only its non-zero elements
    pub fn from_dense(src: &DenseMat) -> Result<Self> {
        Self::from_dense_with_config(src, SparseMatConfig::default())
    }

    /// [`from_dense`](Self::from_dense) with an explicit configuration
    pub fn from_dense_with_config(src: &DenseMat, config: SparseMatConfig) -> Result<Self> {
        let mut m = Self::with_config(config)?;
        m.create(src.size(), src.elem_type())?;
        {
            let shared = m.shared()?;
            let mut hdr = shared.borrow_mut()?;
            src.for_each_element(|idx, bytes| {
                if !is_zero_elem(bytes) {
                    let nidx = hdr.new_node(idx, hash_coords(idx))?;
                    hdr.node_value_mut(nidx).copy_from_slice(bytes);
                }
                Ok(())
            })?;
        }
        Ok(m)
    }

    /// Configuration used for headers created through this handle
    #[inline]
    pub fn config(&self) -> &SparseMatConfig {
        &self.config
    }

    fn shared(&self) -> Result<&Rc<SharedHeader>> {
        self.shared.as_ref().ok_or(SparseError::Uninitialized)
    }

    /// (Re)shape the matrix
    ///
    /// When this handle is the only owner of a header with exactly this shape
    /// the header is cleared and reused. Otherwise this handle lets go of its
    /// header and gets a fresh one; other handles keep the old content.
    pub fn create(&mut self, sizes: &[i32], elem_type: ElemType) -> Result<()> {
        let shape = SparseShape::new(sizes, elem_type)?;
        if let Some(shared) = &self.shared {
            if Rc::strong_count(shared) == 1 && shared.shape == shape {
                shared.borrow_mut()?.clear();
                return Ok(());
            }
        }
        self.shared = Some(Rc::new(SharedHeader::new(shape, self.config.clone())?));
        Ok(())
    }

    /// Remove every element; a no-op on an uninitialized handle
    pub fn clear(&mut self) -> Result<()> {
        if let Some(shared) = &self.shared {
            shared.borrow_mut()?.clear();
        }
        Ok(())
    }

    /// Drop this handle's reference; the header is freed with its last handle
    pub fn release(&mut self) {
        self.shared = None;
    }

    /// True once the handle has a header
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.shared.is_some()
    }

    /// Number of handles sharing the header, 0 when uninitialized
    pub fn ref_count(&self) -> usize {
        self.shared.as_ref().map_or(0, Rc::strong_count)
    }

    /// True when other handles share the header
    pub fn is_shared(&self) -> bool {
        self.ref_count() > 1
    }

    /// True when both handles point at the same header
    pub fn shares_header_with(&self, other: &SparseMat) -> bool {
        match (&self.shared, &other.shared) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Independent copy with its own header
    pub fn deep_clone(&self) -> Result<SparseMat> {
        let mut m = Self {
            shared: None,
            config: self.config.clone(),
        };
        if self.shared.is_some() {
            self.copy_to(&mut m)?;
        }
        Ok(m)
    }

    /// Number of dimensions, 0 when uninitialized
    pub fn dims(&self) -> usize {
        self.shared.as_ref().map_or(0, |s| s.shape.dims())
    }

    /// Extent of every dimension
    pub fn size(&self) -> &[i32] {
        self.shared
            .as_ref()
            .map(|s| s.shape.sizes())
            .unwrap_or(&[])
    }

    /// Extent of dimension `i`, 0 past the last dimension
    pub fn size_of(&self, i: usize) -> i32 {
        self.size().get(i).copied().unwrap_or(0)
    }

    /// Element type, `None` when uninitialized
    pub fn elem_type(&self) -> Option<ElemType> {
        self.shared.as_ref().map(|s| s.shape.elem_type())
    }

    /// Numeric depth of the channels
    pub fn depth(&self) -> Option<Depth> {
        self.elem_type().map(|t| t.depth)
    }

    /// Channel count, 0 when uninitialized
    pub fn channels(&self) -> usize {
        self.elem_type().map_or(0, |t| t.channels)
    }

    /// Bytes per element, 0 when uninitialized
    pub fn elem_size(&self) -> usize {
        self.elem_type().map_or(0, |t| t.elem_size())
    }

    /// Number of stored elements, 0 when uninitialized
    pub fn nz_count(&self) -> usize {
        self.shared.as_ref().map_or(0, |s| s.nz_count.get())
    }

    /// Number of hash buckets, 0 when uninitialized
    pub fn hash_size(&self) -> usize {
        self.shared.as_ref().map_or(0, |s| s.hash_size.get())
    }

    /// Occupancy statistics
    pub fn stats(&self) -> Result<SparseStats> {
        Ok(self.shared()?.borrow()?.stats())
    }

    /// Shared borrow of the storage, for iteration
    pub fn header(&self) -> Result<Ref<'_, SparseHeader>> {
        self.shared()?.borrow()
    }

    /// Hash of a coordinate tuple, usable as a hint to the access methods
    #[inline]
    pub fn hash(&self, idx: &[i32]) -> u64 {
        hash_coords(idx)
    }

    /// Rebuild the hash directory with at least `new_size` buckets
    pub fn resize_hash_tab(&mut self, new_size: usize) -> Result<()> {
        self.shared()?.borrow_mut()?.resize_hash_tab(new_size)
    }

    /// Value bytes at `idx`
    ///
    /// A missing element yields `None`, or a new zero-valued element when
    /// `create_missing` is set. `hashval` must equal [`hash`](Self::hash) of
    /// `idx` when given.
    pub fn ptr(
        &mut self,
        idx: &[i32],
        create_missing: bool,
        hashval: Option<u64>,
    ) -> Result<Option<RefMut<'_, [u8]>>> {
        let shared = self.shared()?;
        shared.check_index(idx)?;
        let h = hashval.unwrap_or_else(|| hash_coords(idx));
        let nidx = {
            let mut hdr = shared.borrow_mut()?;
            if create_missing {
                hdr.find_or_insert(idx, h)?
            } else {
                match hdr.find_node(idx, h) {
                    Some(nidx) => nidx,
                    None => return Ok(None),
                }
            }
        };
        let hdr = shared.borrow_raw_mut()?;
        Ok(Some(RefMut::map(hdr, |hdr| hdr.node_value_mut(nidx))))
    }

    /// Remove the element at `idx`; returns whether it was stored
    pub fn erase(&mut self, idx: &[i32], hashval: Option<u64>) -> Result<bool> {
        let shared = self.shared()?;
        shared.check_index(idx)?;
        let h = hashval.unwrap_or_else(|| hash_coords(idx));
        Ok(shared.borrow_mut()?.erase(idx, h))
    }

    /// True when an element is stored at `idx`
    pub fn contains(&self, idx: &[i32]) -> Result<bool> {
        let shared = self.shared()?;
        shared.check_index(idx)?;
        Ok(shared.borrow()?.find_node(idx, hash_coords(idx)).is_some())
    }

    /// Stored element at `idx`, `None` when absent
    pub fn find<T: Element>(&self, idx: &[i32]) -> Result<Option<T>> {
        let shared = self.shared()?;
        shared.check_type::<T>()?;
        shared.check_index(idx)?;
        let hdr = shared.borrow()?;
        Ok(hdr
            .find_node(idx, hash_coords(idx))
            .map(|nidx| T::read_elem(hdr.node_value(nidx))))
    }

    /// Element at `idx`, zero when absent
    pub fn value<T: Element>(&self, idx: &[i32]) -> Result<T> {
        Ok(self.find(idx)?.unwrap_or_else(T::zero))
    }

    /// Store `value` at `idx`, inserting the element if needed
    pub fn set<T: Element>(&mut self, idx: &[i32], value: T) -> Result<()> {
        self.with_value_mut(idx, |v: &mut T| *v = value)
    }

    /// Run `f` on the element at `idx`, inserting a zero element if needed
    pub fn with_value_mut<T, R, F>(&mut self, idx: &[i32], f: F) -> Result<R>
    where
        T: Element,
        F: FnOnce(&mut T) -> R,
    {
        let shared = self.shared()?;
        shared.check_type::<T>()?;
        shared.check_index(idx)?;
        let mut hdr = shared.borrow_mut()?;
        let nidx = hdr.find_or_insert(idx, hash_coords(idx))?;
        let bytes = hdr.node_value_mut(nidx);
        let mut value = T::read_elem(bytes);
        let out = f(&mut value);
        value.write_elem(bytes);
        Ok(out)
    }

    /// Copy every element into `dst`, recreating it with this shape
    ///
    /// A no-op when both handles share the header.
    pub fn copy_to(&self, dst: &mut SparseMat) -> Result<()> {
        let shared = self.shared()?;
        if self.shares_header_with(dst) {
            return Ok(());
        }
        dst.create(shared.shape.sizes(), shared.shape.elem_type())?;

        let src = shared.borrow()?;
        let mut out = dst.shared()?.borrow_mut()?;
        let dims = shared.shape.dims();
        let mut idx = [0i32; MAX_DIM];
        for node in src.iter() {
            node.read_coords(&mut idx[..dims]);
            let nidx = out.new_node(&idx[..dims], node.hash())?;
            out.node_value_mut(nidx).copy_from_slice(node.value_bytes());
        }
        Ok(())
    }

    /// Write every element into a dense matrix of the same shape
    ///
    /// The dense matrix is recreated and zero-filled first. A stored coordinate
    /// outside the extents fails with `OutOfBounds` before `dst` is touched.
    pub fn copy_to_dense<D: DenseTarget + ?Sized>(&self, dst: &mut D) -> Result<()> {
        let shared = self.shared()?;
        let src = shared.borrow()?;
        shared.check_extents(&src)?;
        dst.create(shared.shape.sizes(), shared.shape.elem_type())?;
        dst.fill(0.0)?;

        let dims = shared.shape.dims();
        let mut idx = [0i32; MAX_DIM];
        for node in src.iter() {
            node.read_coords(&mut idx[..dims]);
            dst.ptr_mut(&idx[..dims])?
                .copy_from_slice(node.value_bytes());
        }
        Ok(())
    }

    /// Convert every element to `depth` (or the current depth) as
    /// `saturate(v * alpha + beta)`, storing the result in `dst`
    ///
    /// When `dst` shares this header and the type is unchanged the values are
    /// rewritten in place. When it shares the header but the type changes, the
    /// result is built in a fresh header and `dst` is re-pointed at it.
    pub fn convert_to(
        &self,
        dst: &mut SparseMat,
        depth: Option<Depth>,
        alpha: f64,
        beta: f64,
    ) -> Result<()> {
        let shared = self.shared()?;
        let src_type = shared.shape.elem_type();
        let dst_type = src_type.with_depth(depth.unwrap_or(src_type.depth));
        let cn = src_type.channels;
        let plain = alpha == 1.0 && beta == 0.0;

        if self.shares_header_with(dst) {
            if dst_type != src_type {
                let mut temp = Self {
                    shared: None,
                    config: dst.config.clone(),
                };
                self.convert_to(&mut temp, Some(dst_type.depth), alpha, beta)?;
                *dst = temp;
                return Ok(());
            }
            if plain {
                return Ok(());
            }
            let cvt = get_convert_scale_elem(src_type.depth, dst_type.depth);
            let mut tmp = vec![0u8; src_type.elem_size()];
            shared.borrow_mut()?.for_each_value_mut(|value| {
                tmp.copy_from_slice(value);
                cvt(&tmp, value, cn, alpha, beta);
            });
            return Ok(());
        }

        dst.create(shared.shape.sizes(), dst_type)?;
        let src = shared.borrow()?;
        let mut out = dst.shared()?.borrow_mut()?;
        let dims = shared.shape.dims();
        let mut idx = [0i32; MAX_DIM];
        if plain {
            let cvt = get_convert_elem(src_type.depth, dst_type.depth);
            for node in src.iter() {
                node.read_coords(&mut idx[..dims]);
                let nidx = out.new_node(&idx[..dims], node.hash())?;
                cvt(node.value_bytes(), out.node_value_mut(nidx), cn);
            }
        } else {
            let cvt = get_convert_scale_elem(src_type.depth, dst_type.depth);
            for node in src.iter() {
                node.read_coords(&mut idx[..dims]);
                let nidx = out.new_node(&idx[..dims], node.hash())?;
                cvt(node.value_bytes(), out.node_value_mut(nidx), cn, alpha, beta);
            }
        }
        Ok(())
    }

    /// Dense counterpart of [`convert_to`](Self::convert_to)
    ///
    /// Cells without a stored element get `saturate(beta)`. Out-of-extent
    /// coordinates are rejected as in [`copy_to_dense`](Self::copy_to_dense).
    pub fn convert_to_dense<D: DenseTarget + ?Sized>(
        &self,
        dst: &mut D,
        depth: Option<Depth>,
        alpha: f64,
        beta: f64,
    ) -> Result<()> {
        let shared = self.shared()?;
        let src_type = shared.shape.elem_type();
        let dst_type = src_type.with_depth(depth.unwrap_or(src_type.depth));
        let cn = src_type.channels;

        let src = shared.borrow()?;
        shared.check_extents(&src)?;
        dst.create(shared.shape.sizes(), dst_type)?;
        dst.fill(beta)?;

        let dims = shared.shape.dims();
        let mut idx = [0i32; MAX_DIM];
        let cvt = get_convert_scale_elem(src_type.depth, dst_type.depth);
        for node in src.iter() {
            node.read_coords(&mut idx[..dims]);
            cvt(node.value_bytes(), dst.ptr_mut(&idx[..dims])?, cn, alpha, beta);
        }
        Ok(())
    }
}

impl fmt::Debug for SparseMat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.shared {
            None => f.write_str("SparseMat(uninitialized)"),
            Some(shared) => f
                .debug_struct("SparseMat")
                .field("size", &shared.shape.sizes())
                .field("elem_type", &format_args!("{}", shared.shape.elem_type()))
                .field("nz_count", &shared.nz_count.get())
                .field("ref_count", &Rc::strong_count(shared))
                .finish(),
        }
    }
}
