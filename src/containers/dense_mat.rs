//! Dense N-dimensional matrix
//!
//! [`DenseMat`] is a plain row-major byte buffer. Sparse matrices read from it
//! and write into anything implementing [`DenseTarget`].

use super::sparse_header::SparseShape;
use crate::elem::{fill_scalar, Depth, ElemType, Element};
use crate::error::{check_bounds, check_dims, Result, SparseError};

/// Destination of a sparse to dense copy or conversion
pub trait DenseTarget {
    /// (Re)allocate storage for the given shape; contents are unspecified
    fn create(&mut self, sizes: &[i32], elem_type: ElemType) -> Result<()>;

    /// Set every channel of every element to `value` saturated to the element depth
    fn fill(&mut self, value: f64) -> Result<()>;

    /// Bytes of the element at `idx`
    fn ptr_mut(&mut self, idx: &[i32]) -> Result<&mut [u8]>;
}

/// Row-major dense matrix over type-erased elements
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMat {
    sizes: Vec<i32>,
    elem_type: ElemType,
    data: Vec<u8>,
}

impl Default for DenseMat {
    fn default() -> Self {
        Self::new()
    }
}

impl DenseMat {
    /// Empty matrix with no dimensions
    pub fn new() -> Self {
        Self {
            sizes: Vec::new(),
            elem_type: ElemType::scalar(Depth::U8),
            data: Vec::new(),
        }
    }

    /// Zero-filled matrix of the given shape
    pub fn with_shape(sizes: &[i32], elem_type: ElemType) -> Result<Self> {
        let mut m = Self::new();
        m.create(sizes, elem_type)?;
        Ok(m)
    }

    /// Number of dimensions, 0 for an empty matrix
    #[inline]
    pub fn dims(&self) -> usize {
        self.sizes.len()
    }

    /// Extent of each dimension
    #[inline]
    pub fn size(&self) -> &[i32] {
        &self.sizes
    }

    /// Element type
    #[inline]
    pub fn elem_type(&self) -> ElemType {
        self.elem_type
    }

    /// Number of elements
    pub fn total(&self) -> usize {
        if self.sizes.is_empty() {
            0
        } else {
            self.sizes.iter().map(|&s| s as usize).product()
        }
    }

    /// Raw bytes in row-major order
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, idx: &[i32]) -> Result<usize> {
        check_dims(idx.len(), self.dims())?;
        let mut linear = 0usize;
        for (&i, &s) in idx.iter().zip(&self.sizes) {
            check_bounds(i, s)?;
            linear = linear * s as usize + i as usize;
        }
        Ok(linear * self.elem_type.elem_size())
    }

    /// Bytes of the element at `idx`
    pub fn ptr(&self, idx: &[i32]) -> Result<&[u8]> {
        let off = self.offset(idx)?;
        Ok(&self.data[off..off + self.elem_type.elem_size()])
    }

    fn check_type<T: Element>(&self) -> Result<()> {
        if T::elem_type() != self.elem_type {
            return Err(SparseError::type_mismatch(self.elem_type, T::elem_type()));
        }
        Ok(())
    }

    /// Element at `idx` decoded as `T`
    pub fn at<T: Element>(&self, idx: &[i32]) -> Result<T> {
        self.check_type::<T>()?;
        Ok(T::read_elem(self.ptr(idx)?))
    }

    /// Store `value` at `idx`
    pub fn set<T: Element>(&mut self, idx: &[i32], value: T) -> Result<()> {
        self.check_type::<T>()?;
        value.write_elem(self.ptr_mut(idx)?);
        Ok(())
    }

    /// Visit every element with its coordinates, in row-major order
    pub fn for_each_element<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&[i32], &[u8]) -> Result<()>,
    {
        let esz = self.elem_type.elem_size();
        if self.sizes.is_empty() || esz == 0 {
            return Ok(());
        }
        let mut idx = vec![0i32; self.dims()];
        for elem in self.data.chunks_exact(esz) {
            f(&idx, elem)?;
            for d in (0..idx.len()).rev() {
                idx[d] += 1;
                if idx[d] < self.sizes[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        Ok(())
    }
}

impl DenseTarget for DenseMat {
    fn create(&mut self, sizes: &[i32], elem_type: ElemType) -> Result<()> {
        SparseShape::new(sizes, elem_type)?;
        let bytes = sizes
            .iter()
            .try_fold(elem_type.elem_size(), |acc, &s| acc.checked_mul(s as usize))
            .ok_or_else(|| SparseError::out_of_memory(usize::MAX))?;

        let mut data = Vec::new();
        data.try_reserve_exact(bytes)
            .map_err(|_| SparseError::out_of_memory(bytes))?;
        data.resize(bytes, 0);

        self.sizes = sizes.to_vec();
        self.elem_type = elem_type;
        self.data = data;
        Ok(())
    }

    fn fill(&mut self, value: f64) -> Result<()> {
        let esz = self.elem_type.elem_size();
        if esz == 0 || self.data.is_empty() {
            return Ok(());
        }
        let mut pattern = vec![0u8; esz];
        fill_scalar(self.elem_type, value, &mut pattern);
        for elem in self.data.chunks_exact_mut(esz) {
            elem.copy_from_slice(&pattern);
        }
        Ok(())
    }

    fn ptr_mut(&mut self, idx: &[i32]) -> Result<&mut [u8]> {
        let off = self.offset(idx)?;
        let esz = self.elem_type.elem_size();
        Ok(&mut self.data[off..off + esz])
    }
}
